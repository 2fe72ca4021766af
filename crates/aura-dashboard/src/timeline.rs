//! TimelineSync - 跟随当前选择拉取实体时间线
//!
//! - 选择变为 `None`：立即重置为空闲，不发请求
//! - 选择变为某个 id：清空数据进入 Loading，后台任务拉取 `timeline/{id}`
//!
//! 快速连续切换依赖 `ResourceSync` 的取代规则保证最终显示的是最后一次选择。
//! `abort_superseded` 打开时还会中止被取代的后台任务，这只是节省网络开销。

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};
use crate::events::EventManager;
use crate::http_client::DashboardApi;
use crate::models::{EntityId, TimelineEvent};
use crate::resource_sync::{Resource, ResourceSync, SyncOutcome, SyncState};
use crate::selection::SelectionState;

pub struct TimelineSync {
    sync: Arc<ResourceSync<TimelineEvent>>,
    api: Arc<dyn DashboardApi>,
    /// 当前时间线对应的实体
    entity_id: Mutex<Option<EntityId>>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
    abort_superseded: bool,
    runtime: Handle,
}

impl TimelineSync {
    /// 必须在 tokio 运行时内创建，拉取任务会派发到该运行时
    pub fn new(
        api: Arc<dyn DashboardApi>,
        events: Option<Arc<EventManager>>,
        abort_superseded: bool,
    ) -> Result<Arc<Self>> {
        let runtime = Handle::try_current()
            .map_err(|e| DashboardError::Other(format!("TimelineSync 需要 tokio 运行时: {}", e)))?;

        Ok(Arc::new(Self {
            sync: Arc::new(ResourceSync::new(Resource::Timeline, events)),
            api,
            entity_id: Mutex::new(None),
            in_flight: Mutex::new(None),
            abort_superseded,
            runtime,
        }))
    }

    /// 订阅选择变化
    ///
    /// 监听器只持有弱引用，TimelineSync 释放后监听器变成空操作。
    pub fn bind(self: &Arc<Self>, selection: &SelectionState) {
        let weak: Weak<Self> = Arc::downgrade(self);
        selection.add_listener(move |current| {
            if let Some(timeline) = weak.upgrade() {
                timeline.on_selection(current);
            }
        });
        info!("🔗 TimelineSync 已绑定选择状态");
    }

    /// 响应一次选择变化（同步返回，拉取在后台进行）
    pub fn on_selection(&self, selection: Option<EntityId>) {
        *self.entity_id.lock() = selection;

        let Some(entity_id) = selection else {
            self.abort_in_flight();
            self.sync.reset_idle();
            return;
        };

        let ticket = self.sync.begin_fresh();
        debug!("📜 拉取实体 {} 的时间线 (#{})", entity_id, ticket.seq());

        let sync = self.sync.clone();
        let api = self.api.clone();
        let task = self.runtime.spawn(async move {
            let result = api.fetch_timeline(entity_id).await;
            if sync.commit(ticket, result) == SyncOutcome::Superseded {
                debug!("📜 实体 {} 的时间线结果已过期", entity_id);
            }
        });

        let previous = self.in_flight.lock().replace(task);
        if let Some(previous) = previous {
            if self.abort_superseded && !previous.is_finished() {
                debug!("✂️ 中止被取代的时间线请求");
                previous.abort();
            }
        }
    }

    fn abort_in_flight(&self) {
        if !self.abort_superseded {
            return;
        }
        if let Some(task) = self.in_flight.lock().take() {
            task.abort();
        }
    }

    /// 当前时间线对应的实体
    pub fn entity_id(&self) -> Option<EntityId> {
        *self.entity_id.lock()
    }

    pub fn state(&self) -> SyncState<TimelineEvent> {
        self.sync.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState<TimelineEvent>> {
        self.sync.subscribe()
    }

    /// 等待当前请求有结论；空闲时立即返回
    pub async fn wait_settled(&self) -> SyncState<TimelineEvent> {
        self.sync.wait_settled().await
    }
}

impl Drop for TimelineSync {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.lock().take() {
            task.abort();
        }
    }
}
