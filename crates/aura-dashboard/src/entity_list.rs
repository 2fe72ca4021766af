//! EntityListSync - 挂载时拉取一次可选实体列表
//!
//! 成功（包括空列表）或失败都是终态，不自动重试。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::events::EventManager;
use crate::http_client::DashboardApi;
use crate::models::Entity;
use crate::resource_sync::{Resource, ResourceSync, SyncOutcome, SyncState};

pub struct EntityListSync {
    sync: ResourceSync<Entity>,
    api: Arc<dyn DashboardApi>,
    mounted: AtomicBool,
}

impl EntityListSync {
    pub fn new(api: Arc<dyn DashboardApi>, events: Option<Arc<EventManager>>) -> Self {
        Self {
            sync: ResourceSync::new(Resource::Entities, events),
            api,
            mounted: AtomicBool::new(false),
        }
    }

    /// 挂载：整个会话只拉取一次，重复调用直接返回当前状态
    pub async fn mount(&self) -> SyncState<Entity> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            debug!("EntityListSync 已挂载，跳过重复拉取");
            return self.sync.state();
        }

        info!("📋 拉取实体列表");
        let api = self.api.clone();
        if self.sync.start(async move { api.fetch_entities().await }).await == SyncOutcome::Committed {
            let state = self.sync.state();
            info!("📋 实体列表: {}（{} 条）", state.status, state.data.len());
        }
        self.sync.state()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SyncState<Entity> {
        self.sync.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState<Entity>> {
        self.sync.subscribe()
    }

    /// 按 id 查找已加载的实体
    pub fn find(&self, id: u64) -> Option<Entity> {
        self.sync.state().data.into_iter().find(|entity| entity.id == id)
    }
}
