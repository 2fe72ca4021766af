//! Aura Dashboard - 校园活动监控面板的数据同步核心
//!
//! 本 crate 负责面板与后端之间的全部数据交换：
//! - 🎯 当前选择的实体（`SelectionState`）
//! - 🔄 通用的资源同步单元（`ResourceSync<T>`），保证只有最后一次请求的结果生效
//! - 📋 实体列表、🚨 告警列表：挂载时各拉取一次
//! - 📜 时间线：跟随当前选择重新拉取
//! - ⚙️ 事件系统：选择变化与同步状态变化汇成一个事件流
//!
//! 与任何 UI 框架无关，展示层只读取快照、订阅变化并调用 `select`。
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use aura_dashboard::{Dashboard, DashboardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DashboardConfig::builder()
//!         .api_base_url("http://localhost:5000/api")
//!         .build();
//!
//!     let dashboard = Dashboard::new(config)?;
//!     dashboard.mount().await;
//!
//!     if let Some(first) = dashboard.entities().state().data.first() {
//!         dashboard.select(first.id);
//!         let timeline = dashboard.timeline().wait_settled().await;
//!         println!("{} 条活动记录", timeline.data.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod version;
pub mod config;
pub mod models;
pub mod http_client;
pub mod events;
pub mod resource_sync;
pub mod selection;
pub mod entity_list;
pub mod alert_feed;
pub mod timeline;
pub mod view;
pub mod dashboard;
pub mod utils;

#[cfg(test)]
mod testing;

// 重新导出核心类型，方便使用
pub use error::{DashboardError, Result};
pub use config::{DashboardConfig, DashboardConfigBuilder, HttpClientConfig};
pub use models::{Alert, Entity, EntityId, Severity, SourceType, TimelineEvent};
pub use http_client::{DashboardApi, HttpApiClient};
pub use events::{DashboardEvent, EventManager, EventStats};
pub use resource_sync::{Resource, ResourceSync, SyncOutcome, SyncState, SyncStatus, SyncTicket};
pub use selection::SelectionState;
pub use entity_list::EntityListSync;
pub use alert_feed::AlertFeedSync;
pub use timeline::TimelineSync;
pub use view::ViewState;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use utils::{TimeFormatter, TimezoneConfig};
