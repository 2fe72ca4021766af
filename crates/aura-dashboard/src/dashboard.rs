//! Dashboard - 组合根
//!
//! 持有配置、数据源、选择状态和三个同步单元。展示层只读取快照或订阅事件，
//! 唯一的写操作是 `select` / `clear_selection`。

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::alert_feed::AlertFeedSync;
use crate::config::DashboardConfig;
use crate::entity_list::EntityListSync;
use crate::error::Result;
use crate::events::{DashboardEvent, EventManager};
use crate::http_client::{DashboardApi, HttpApiClient};
use crate::models::{Alert, Entity, EntityId, TimelineEvent};
use crate::resource_sync::{Resource, SyncState};
use crate::selection::SelectionState;
use crate::timeline::TimelineSync;
use crate::version;
use crate::view::ViewState;

/// 某一时刻整个面板的只读快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub selection: Option<EntityId>,
    pub entities: SyncState<Entity>,
    pub timeline: SyncState<TimelineEvent>,
    pub alerts: SyncState<Alert>,
    pub entity_view: ViewState,
    pub timeline_view: ViewState,
    pub alert_view: ViewState,
}

pub struct Dashboard {
    config: DashboardConfig,
    events: Arc<EventManager>,
    selection: SelectionState,
    entities: EntityListSync,
    alerts: AlertFeedSync,
    timeline: Arc<TimelineSync>,
}

impl Dashboard {
    /// 使用 HTTP 数据源创建（需要在 tokio 运行时内调用）
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let api: Arc<dyn DashboardApi> = Arc::new(HttpApiClient::new(&config)?);
        Self::with_api(config, api)
    }

    /// 使用自定义数据源创建
    pub fn with_api(config: DashboardConfig, api: Arc<dyn DashboardApi>) -> Result<Self> {
        let events = Arc::new(EventManager::new(config.event_buffer_size));
        let selection = SelectionState::new(Some(events.clone()));
        let entities = EntityListSync::new(api.clone(), Some(events.clone()));
        let alerts = AlertFeedSync::new(api.clone(), Some(events.clone()));
        let timeline = TimelineSync::new(api, Some(events.clone()), config.abort_superseded)?;
        timeline.bind(&selection);

        info!(
            "🚀 Dashboard 已创建: {} (api_base_url: {})",
            version::version_line(),
            config.api_base_url
        );

        Ok(Self {
            config,
            events,
            selection,
            entities,
            alerts,
            timeline,
        })
    }

    /// 挂载：并发拉取实体列表和告警列表，两者互不阻塞
    ///
    /// 每个会话只拉取一次，重复调用不会再发请求。
    pub async fn mount(&self) {
        info!("📦 挂载 Dashboard");
        let (entities, alerts) = futures::join!(self.entities.mount(), self.alerts.mount());
        info!(
            "📦 挂载完成: entities={} alerts={}",
            entities.status, alerts.status
        );
    }

    /// 选择实体，时间线随之重新拉取
    pub fn select(&self, entity_id: EntityId) {
        self.selection.select(Some(entity_id));
    }

    pub fn clear_selection(&self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> Option<EntityId> {
        self.selection.current()
    }

    /// 当前选择对应的实体（不在列表中时为 None）
    pub fn selected_entity(&self) -> Option<Entity> {
        self.selection.current().and_then(|id| self.entities.find(id))
    }

    pub fn selection_state(&self) -> &SelectionState {
        &self.selection
    }

    pub fn entities(&self) -> &EntityListSync {
        &self.entities
    }

    pub fn alerts(&self) -> &AlertFeedSync {
        &self.alerts
    }

    pub fn timeline(&self) -> &TimelineSync {
        &self.timeline
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// 订阅所有选择和同步状态变化
    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let entities = self.entities.state();
        let timeline = self.timeline.state();
        let alerts = self.alerts.state();

        DashboardSnapshot {
            selection: self.selection.current(),
            entity_view: ViewState::derive(Resource::Entities, &entities),
            timeline_view: ViewState::derive(Resource::Timeline, &timeline),
            alert_view: ViewState::derive(Resource::Alerts, &alerts),
            entities,
            timeline,
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::models::{Severity, SourceType};
    use crate::resource_sync::SyncStatus;
    use crate::testing::{alert, entity, ScriptedApi};
    use crate::view::{ALERTS_FAILED, TIMELINE_PLACEHOLDER};
    use std::time::Duration;

    fn dashboard(api: Arc<ScriptedApi>) -> Dashboard {
        Dashboard::with_api(DashboardConfig::default(), api).unwrap()
    }

    #[tokio::test]
    async fn test_select_then_deselect_end_to_end() {
        let api = Arc::new(ScriptedApi::new());
        api.set_entities(Ok(vec![entity(1, "Bldg A", "room")]));
        let body = serde_json::json!({
            "events": [{
                "id": 9,
                "description": "door opened",
                "timestamp": "2024-01-01T10:00:00Z",
                "location": "Bldg A",
                "source_type": "swipe"
            }]
        });
        api.set_timeline(
            1,
            Duration::ZERO,
            crate::http_client::parse_envelope(body, crate::http_client::EVENTS_ENVELOPE),
        );

        let dashboard = dashboard(api.clone());
        dashboard.mount().await;
        assert_eq!(dashboard.entities().state().data.len(), 1);

        dashboard.select(1);
        assert_eq!(dashboard.selected_entity().map(|e| e.display_label()), Some("Bldg A (room)".to_string()));
        let timeline = dashboard.timeline().wait_settled().await;
        assert_eq!(api.timeline_calls(), vec![1]);
        assert_eq!(timeline.status, SyncStatus::Success);
        assert_eq!(timeline.data.len(), 1);
        assert_eq!(timeline.data[0].source_type, SourceType::Swipe);
        assert_eq!(timeline.data[0].description, "door opened");

        dashboard.clear_selection();
        let snapshot = dashboard.snapshot();
        assert_eq!(snapshot.selection, None);
        assert_eq!(snapshot.timeline, SyncState::idle());
        assert_eq!(snapshot.timeline_view, ViewState::Placeholder(TIMELINE_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_alert_failure_is_isolated() {
        let api = Arc::new(ScriptedApi::new());
        api.set_entities(Ok(vec![entity(1, "Alice", "student")]));
        api.set_alerts(Err(DashboardError::HttpError {
            status: 503,
            body: "unavailable".into(),
        }));
        let dashboard = dashboard(api);
        dashboard.mount().await;
        dashboard.select(1);
        dashboard.timeline().wait_settled().await;

        let snapshot = dashboard.snapshot();
        assert_eq!(snapshot.alert_view, ViewState::Failed(ALERTS_FAILED));
        assert_eq!(snapshot.entities.status, SyncStatus::Success);
        assert_eq!(snapshot.timeline.status, SyncStatus::Success);
    }

    #[tokio::test]
    async fn test_slow_alerts_do_not_block_entities() {
        let api = Arc::new(ScriptedApi::new());
        api.set_entities(Ok(vec![entity(1, "Alice", "student")]));
        api.set_alerts(Ok(vec![alert(1, "late", Severity::Medium)]));
        api.set_alert_delay(Duration::from_millis(200));
        let dashboard = Arc::new(dashboard(api.clone()));

        let mount = {
            let dashboard = dashboard.clone();
            tokio::spawn(async move { dashboard.mount().await })
        };

        let mut entities_rx = dashboard.entities().subscribe();
        entities_rx
            .wait_for(|state| state.status == SyncStatus::Success)
            .await
            .unwrap();
        assert_eq!(dashboard.alerts().state().status, SyncStatus::Loading);

        mount.await.unwrap();
        assert_eq!(dashboard.alerts().state().data.len(), 1);

        // 再次挂载不会重复请求
        dashboard.mount().await;
        assert_eq!(api.entity_calls(), 1);
        assert_eq!(api.alert_calls(), 1);
    }

    #[tokio::test]
    async fn test_events_stream_sees_selection_and_sync() {
        let api = Arc::new(ScriptedApi::new());
        let dashboard = dashboard(api);
        let mut rx = dashboard.subscribe_events();

        dashboard.select(7);
        dashboard.timeline().wait_settled().await;

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push((event.event_type(), event.resource()));
        }
        assert_eq!(kinds[0], ("selection_changed", None));
        assert!(kinds.contains(&("sync_state_changed", Some(Resource::Timeline))));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_creation_logs_version_banner() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(async {
                dashboard(Arc::new(ScriptedApi::new()));
            });
        });

        let logs = String::from_utf8_lossy(&buffer.0.lock()).to_string();
        assert!(logs.contains(&crate::version::version_line()));
    }

    #[test]
    fn test_new_requires_valid_base_url() {
        let config = DashboardConfig::builder().origin("not-a-url").build();
        let err = tokio_test::block_on(async { Dashboard::new(config).err() });
        assert_eq!(err.map(|e| e.kind()), Some("config"));
    }
}
