//! 展示层契约：把 `SyncState` 映射为与 UI 框架无关的视图状态
//!
//! 失败和"成功但为空"是两种不同的视图，不能合并。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Alert, TimelineEvent};
use crate::resource_sync::{Resource, SyncState, SyncStatus};
use crate::utils::TimeFormatter;

pub const ENTITIES_FAILED: &str = "Failed to load entities. Please try again later.";
pub const TIMELINE_FAILED: &str = "Failed to fetch timeline data.";
pub const ALERTS_FAILED: &str = "Failed to load alerts. Please try again later.";

pub const ENTITIES_EMPTY: &str = "No entities available.";
pub const TIMELINE_EMPTY: &str = "No activity recorded for the selected entity.";
pub const ALERTS_EMPTY: &str = "No new alerts have been triggered.";

pub const TIMELINE_PLACEHOLDER: &str = "Please select an entity to view their activity timeline.";

/// 单个区域的视图状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ViewState {
    /// 时间线未选择实体
    Placeholder(&'static str),
    Loading(&'static str),
    Failed(&'static str),
    Empty(&'static str),
    /// 有数据，携带条数
    Populated(usize),
}

impl ViewState {
    pub fn derive<T>(resource: Resource, state: &SyncState<T>) -> Self {
        match state.status {
            SyncStatus::Idle => match resource {
                Resource::Timeline => ViewState::Placeholder(TIMELINE_PLACEHOLDER),
                // 列表在挂载前还没开始拉取，与加载中同样显示
                _ => ViewState::Loading(loading_label(resource)),
            },
            SyncStatus::Loading => ViewState::Loading(loading_label(resource)),
            SyncStatus::Error => ViewState::Failed(failed_notice(resource)),
            SyncStatus::Success if state.data.is_empty() => ViewState::Empty(empty_notice(resource)),
            SyncStatus::Success => ViewState::Populated(state.data.len()),
        }
    }

    /// 提示文本；有数据时为空
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ViewState::Placeholder(text)
            | ViewState::Loading(text)
            | ViewState::Failed(text)
            | ViewState::Empty(text) => Some(text),
            ViewState::Populated(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ViewState::Failed(_))
    }
}

fn loading_label(resource: Resource) -> &'static str {
    match resource {
        Resource::Entities => "Loading Entities...",
        Resource::Timeline => "Loading Timeline...",
        Resource::Alerts => "Loading Alerts...",
    }
}

fn failed_notice(resource: Resource) -> &'static str {
    match resource {
        Resource::Entities => ENTITIES_FAILED,
        Resource::Timeline => TIMELINE_FAILED,
        Resource::Alerts => ALERTS_FAILED,
    }
}

fn empty_notice(resource: Resource) -> &'static str {
    match resource {
        Resource::Entities => ENTITIES_EMPTY,
        Resource::Timeline => TIMELINE_EMPTY,
        Resource::Alerts => ALERTS_EMPTY,
    }
}

/// 告警副标题，例如 "Triggered about 2 hours ago for Alice"
pub fn alert_subtitle(alert: &Alert, now: &DateTime<Utc>) -> String {
    let distance = TimeFormatter::format_distance(&alert.timestamp, now);
    if alert.entity_name.is_empty() {
        format!("Triggered {} ago", distance)
    } else {
        format!("Triggered {} ago for {}", distance, alert.entity_name)
    }
}

/// 时间线条目的次要信息："{本地时间} · {地点}"
pub fn timeline_caption(event: &TimelineEvent) -> String {
    let when = TimeFormatter::format_local(&event.timestamp);
    if event.location.is_empty() {
        when
    } else {
        format!("{} · {}", when, event.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::models::Severity;
    use crate::resource_sync::ResourceSync;
    use crate::testing::{alert, event};
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_timeline_idle_is_placeholder() {
        let state: SyncState<TimelineEvent> = SyncState::idle();
        let view = ViewState::derive(Resource::Timeline, &state);
        assert_eq!(view, ViewState::Placeholder(TIMELINE_PLACEHOLDER));
    }

    #[test]
    fn test_failed_and_empty_are_distinct() {
        let sync: ResourceSync<Alert> = ResourceSync::new(Resource::Alerts, None);
        let ticket = sync.begin();
        assert_eq!(
            ViewState::derive(Resource::Alerts, &sync.state()),
            ViewState::Loading("Loading Alerts...")
        );
        sync.commit(ticket, Ok(Vec::new()));
        let empty = ViewState::derive(Resource::Alerts, &sync.state());

        let ticket = sync.begin();
        sync.commit(ticket, Err(DashboardError::NetworkFailure("refused".into())));
        let failed = ViewState::derive(Resource::Alerts, &sync.state());

        assert_eq!(empty, ViewState::Empty(ALERTS_EMPTY));
        assert_eq!(failed, ViewState::Failed(ALERTS_FAILED));
        assert_ne!(empty.notice(), failed.notice());
        assert!(failed.is_failed());
    }

    #[test]
    fn test_populated_has_count_and_no_notice() {
        let state = SyncState {
            status: SyncStatus::Success,
            data: vec![event(1, "a"), event(2, "b")],
            error_detail: None,
        };
        let view = ViewState::derive(Resource::Timeline, &state);
        assert_eq!(view, ViewState::Populated(2));
        assert_eq!(view.notice(), None);
    }

    #[test]
    fn test_alert_subtitle() {
        let mut item = alert(1, "Entity inactive", Severity::High);
        let now = item.timestamp + Duration::hours(2);
        assert_eq!(alert_subtitle(&item, &now), "Triggered about 2 hours ago for Alice");

        item.entity_name.clear();
        assert_eq!(alert_subtitle(&item, &now), "Triggered about 2 hours ago");
    }

    #[test]
    fn test_timeline_caption_includes_location() {
        let item = event(9, "door opened");
        let caption = timeline_caption(&item);
        assert!(caption.ends_with(" · Bldg A"));

        let mut no_location = item.clone();
        no_location.location.clear();
        no_location.timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(!timeline_caption(&no_location).contains('·'));
    }
}
