//! AlertFeedSync - 挂载时拉取一次告警列表
//!
//! 与选择无关，生命周期独立；失败不会影响其它单元。没有轮询刷新。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::events::EventManager;
use crate::http_client::DashboardApi;
use crate::models::{Alert, Severity};
use crate::resource_sync::{Resource, ResourceSync, SyncOutcome, SyncState};

pub struct AlertFeedSync {
    sync: ResourceSync<Alert>,
    api: Arc<dyn DashboardApi>,
    mounted: AtomicBool,
}

impl AlertFeedSync {
    pub fn new(api: Arc<dyn DashboardApi>, events: Option<Arc<EventManager>>) -> Self {
        Self {
            sync: ResourceSync::new(Resource::Alerts, events),
            api,
            mounted: AtomicBool::new(false),
        }
    }

    /// 挂载：整个会话只拉取一次
    pub async fn mount(&self) -> SyncState<Alert> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            debug!("AlertFeedSync 已挂载，跳过重复拉取");
            return self.sync.state();
        }

        info!("🚨 拉取告警列表");
        let api = self.api.clone();
        if self.sync.start(async move { api.fetch_alerts().await }).await == SyncOutcome::Committed {
            let state = self.sync.state();
            info!("🚨 告警列表: {}（{} 条）", state.status, state.data.len());
        }
        self.sync.state()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SyncState<Alert> {
        self.sync.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState<Alert>> {
        self.sync.subscribe()
    }

    /// 已加载告警中不低于指定级别的数量
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.sync
            .state()
            .data
            .iter()
            .filter(|alert| alert.severity >= severity)
            .count()
    }
}
