//! 测试用的内存数据源：按资源预置结果，可为每个实体设置延迟，并统计调用次数

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use crate::error::Result;
use crate::http_client::DashboardApi;
use crate::models::{Alert, Entity, EntityId, Severity, SourceType, TimelineEvent};

pub(crate) fn entity(id: EntityId, name: &str, entity_type: &str) -> Entity {
    Entity {
        id,
        name: name.to_string(),
        entity_type: entity_type.to_string(),
        primary_email: None,
    }
}

pub(crate) fn event(id: u64, description: &str) -> TimelineEvent {
    TimelineEvent {
        id: Some(id),
        description: description.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        location: "Bldg A".to_string(),
        source_type: SourceType::Swipe,
    }
}

pub(crate) fn alert(id: u64, message: &str, severity: Severity) -> Alert {
    Alert {
        id,
        message: message.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        entity_name: "Alice".to_string(),
        severity,
    }
}

struct TimelineScript {
    delay: Duration,
    result: Result<Vec<TimelineEvent>>,
}

pub(crate) struct ScriptedApi {
    entities: Mutex<Result<Vec<Entity>>>,
    alerts: Mutex<Result<Vec<Alert>>>,
    alert_delay: Mutex<Duration>,
    timelines: Mutex<HashMap<EntityId, TimelineScript>>,
    entity_calls: AtomicUsize,
    alert_calls: AtomicUsize,
    timeline_calls: Mutex<Vec<EntityId>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self {
            entities: Mutex::new(Ok(Vec::new())),
            alerts: Mutex::new(Ok(Vec::new())),
            alert_delay: Mutex::new(Duration::ZERO),
            timelines: Mutex::new(HashMap::new()),
            entity_calls: AtomicUsize::new(0),
            alert_calls: AtomicUsize::new(0),
            timeline_calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_entities(&self, result: Result<Vec<Entity>>) {
        *self.entities.lock() = result;
    }

    pub(crate) fn set_alerts(&self, result: Result<Vec<Alert>>) {
        *self.alerts.lock() = result;
    }

    pub(crate) fn set_alert_delay(&self, delay: Duration) {
        *self.alert_delay.lock() = delay;
    }

    /// 未预置的实体返回空时间线
    pub(crate) fn set_timeline(
        &self,
        entity_id: EntityId,
        delay: Duration,
        result: Result<Vec<TimelineEvent>>,
    ) {
        self.timelines
            .lock()
            .insert(entity_id, TimelineScript { delay, result });
    }

    pub(crate) fn entity_calls(&self) -> usize {
        self.entity_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn alert_calls(&self) -> usize {
        self.alert_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn timeline_calls(&self) -> Vec<EntityId> {
        self.timeline_calls.lock().clone()
    }
}

#[async_trait]
impl DashboardApi for ScriptedApi {
    async fn fetch_entities(&self) -> Result<Vec<Entity>> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        self.entities.lock().clone()
    }

    async fn fetch_timeline(&self, entity_id: EntityId) -> Result<Vec<TimelineEvent>> {
        self.timeline_calls.lock().push(entity_id);
        let (delay, result) = match self.timelines.lock().get(&entity_id) {
            Some(script) => (script.delay, script.result.clone()),
            None => (Duration::ZERO, Ok(Vec::new())),
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn fetch_alerts(&self) -> Result<Vec<Alert>> {
        self.alert_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.alert_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.alerts.lock().clone()
    }
}
