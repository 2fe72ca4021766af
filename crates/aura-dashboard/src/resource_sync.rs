//! ResourceSync - 单个远端资源的同步单元
//!
//! 一个单元 = 一次异步拉取 + 一份可直接渲染的 `SyncState<T>`。
//!
//! ## 取代规则
//!
//! 每次 `begin` 都会分配一个单调递增的序号（`SyncTicket`）。拉取完成后
//! 用 `commit` 提交结果：只有序号等于单元当前"最新序号"的结果才会写入状态，
//! 其余结果（无论成功还是失败）到达时直接丢弃。`reset_idle` 同样推进序号，
//! 所以取消选择之后迟到的结果也不会覆盖空闲状态。
//!
//! 序号比较与状态写入在同一把锁内完成，多线程运行时下同样成立。

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::{DashboardEvent, EventManager};

/// 同步单元对应的资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Entities,
    Timeline,
    Alerts,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Entities => "entities",
            Resource::Timeline => "timeline",
            Resource::Alerts => "alerts",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 同步状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    /// 空闲（未触发）
    Idle,
    /// 拉取中
    Loading,
    /// 已成功（数据可能为空）
    Success,
    /// 失败
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::Loading => write!(f, "loading"),
            SyncStatus::Success => write!(f, "success"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}

/// 一个同步单元的可渲染状态
///
/// 不变式：`Success` 时 `error_detail` 为空；`Error` 时 `data` 为空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState<T> {
    pub status: SyncStatus,
    pub data: Vec<T>,
    pub error_detail: Option<String>,
}

impl<T> SyncState<T> {
    pub fn idle() -> Self {
        Self {
            status: SyncStatus::Idle,
            data: Vec::new(),
            error_detail: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == SyncStatus::Loading
    }

    /// 已经有了结论（成功或失败）
    pub fn is_settled(&self) -> bool {
        matches!(self.status, SyncStatus::Success | SyncStatus::Error)
    }

    /// 成功且无数据（与失败区分）
    pub fn is_empty_success(&self) -> bool {
        self.status == SyncStatus::Success && self.data.is_empty()
    }
}

impl<T> Default for SyncState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// 一次 `begin` 调用的身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncTicket {
    seq: u64,
}

impl SyncTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// 提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// 结果已写入状态
    Committed,
    /// 已有更新的请求，结果被丢弃
    Superseded,
}

/// 资源同步单元
///
/// 状态只由本单元写入；读取方通过 `state()` 取快照或 `subscribe()` 订阅变化。
pub struct ResourceSync<T> {
    resource: Resource,
    /// 最新发出的序号
    latest: Mutex<u64>,
    state: watch::Sender<SyncState<T>>,
    events: Option<Arc<EventManager>>,
}

impl<T> ResourceSync<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(resource: Resource, events: Option<Arc<EventManager>>) -> Self {
        let (state, _) = watch::channel(SyncState::idle());
        Self {
            resource,
            latest: Mutex::new(0),
            state,
            events,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// 发起一次拉取：进入 Loading，保留上一次的数据
    pub fn begin(&self) -> SyncTicket {
        self.begin_with(false)
    }

    /// 发起一次拉取：进入 Loading，并清空数据
    pub fn begin_fresh(&self) -> SyncTicket {
        self.begin_with(true)
    }

    fn begin_with(&self, clear_data: bool) -> SyncTicket {
        let ticket = {
            let mut latest = self.latest.lock();
            *latest += 1;
            self.state.send_modify(|state| {
                state.status = SyncStatus::Loading;
                state.error_detail = None;
                if clear_data {
                    state.data.clear();
                }
            });
            SyncTicket { seq: *latest }
        };
        debug!("🔄 [{}] 发起请求 #{}", self.resource, ticket.seq);
        self.publish();
        ticket
    }

    /// 提交一次拉取的结果
    ///
    /// 只有最新序号的结果会写入；过期结果原样丢弃，不修改任何状态。
    pub fn commit(&self, ticket: SyncTicket, result: Result<Vec<T>>) -> SyncOutcome {
        {
            let latest = self.latest.lock();
            if ticket.seq != *latest {
                debug!(
                    "⏭️ [{}] 丢弃过期结果 #{}（最新 #{}，ok={}）",
                    self.resource,
                    ticket.seq,
                    *latest,
                    result.is_ok()
                );
                return SyncOutcome::Superseded;
            }

            let next = match result {
                Ok(data) => {
                    debug!("✅ [{}] 请求 #{} 成功: {} 条", self.resource, ticket.seq, data.len());
                    SyncState {
                        status: SyncStatus::Success,
                        data,
                        error_detail: None,
                    }
                }
                Err(e) => {
                    warn!("❌ [{}] 请求 #{} 失败 ({}): {}", self.resource, ticket.seq, e.kind(), e);
                    SyncState {
                        status: SyncStatus::Error,
                        data: Vec::new(),
                        error_detail: Some(e.to_string()),
                    }
                }
            };
            self.state.send_replace(next);
        }
        self.publish();
        SyncOutcome::Committed
    }

    /// 发起、等待并提交一次拉取
    pub async fn start<F>(&self, fetch: F) -> SyncOutcome
    where
        F: Future<Output = Result<Vec<T>>>,
    {
        let ticket = self.begin();
        let result = fetch.await;
        self.commit(ticket, result)
    }

    /// 重置为空闲，并让所有在途请求失效
    pub fn reset_idle(&self) {
        {
            let mut latest = self.latest.lock();
            *latest += 1;
            self.state.send_replace(SyncState::idle());
        }
        debug!("⏹️ [{}] 重置为空闲", self.resource);
        self.publish();
    }

    /// 票据是否仍是最新
    pub fn is_current(&self, ticket: SyncTicket) -> bool {
        *self.latest.lock() == ticket.seq
    }

    /// 当前状态快照
    pub fn state(&self) -> SyncState<T> {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.state.borrow().status
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<SyncState<T>> {
        self.state.subscribe()
    }

    /// 等待状态离开 Loading，返回当时的快照
    pub async fn wait_settled(&self) -> SyncState<T> {
        let mut rx = self.state.subscribe();
        let settled = rx.wait_for(|state| !state.is_loading()).await;
        match settled {
            Ok(state) => state.clone(),
            // Sender 由 self 持有，不会在这里被释放
            Err(_) => self.state(),
        }
    }

    fn publish(&self) {
        if let Some(events) = &self.events {
            let (status, item_count, error_detail) = {
                let state = self.state.borrow();
                (state.status, state.data.len(), state.error_detail.clone())
            };
            events.emit(DashboardEvent::SyncStateChanged {
                resource: self.resource,
                status,
                item_count,
                error_detail,
            });
        }
    }
}
