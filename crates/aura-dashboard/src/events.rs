//! 事件系统模块 - 把选择变化和各同步单元的状态变化汇成一个事件流
//!
//! 展示层可以只订阅这一条流，而不必分别订阅每个单元。

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::models::EntityId;
use crate::resource_sync::{Resource, SyncStatus};

/// Dashboard 事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashboardEvent {
    /// 当前选择的实体变化
    SelectionChanged {
        previous: Option<EntityId>,
        current: Option<EntityId>,
    },
    /// 同步单元状态变化
    SyncStateChanged {
        resource: Resource,
        status: SyncStatus,
        item_count: usize,
        error_detail: Option<String>,
    },
}

impl DashboardEvent {
    /// 获取事件类型字符串
    pub fn event_type(&self) -> &'static str {
        match self {
            DashboardEvent::SelectionChanged { .. } => "selection_changed",
            DashboardEvent::SyncStateChanged { .. } => "sync_state_changed",
        }
    }

    /// 事件关联的资源
    pub fn resource(&self) -> Option<Resource> {
        match self {
            DashboardEvent::SyncStateChanged { resource, .. } => Some(*resource),
            DashboardEvent::SelectionChanged { .. } => None,
        }
    }
}

/// 事件监听器类型
pub type EventListener = Box<dyn Fn(&DashboardEvent) + Send + Sync>;

/// 事件统计信息
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    /// 总事件数
    pub total_events: u64,
    /// 按类型分组的事件数
    pub events_by_type: HashMap<String, u64>,
    /// 监听器数量
    pub listener_count: usize,
}

/// 事件管理器
///
/// `emit` 是同步的：先广播，再按注册顺序调用监听器。
/// 监听器内部不能再调用 `add_listener` / `clear_listeners`。
pub struct EventManager {
    /// 广播发送器
    sender: broadcast::Sender<DashboardEvent>,
    /// 事件监听器
    listeners: RwLock<Vec<EventListener>>,
    /// 事件统计
    stats: RwLock<EventStats>,
}

impl EventManager {
    /// 创建新的事件管理器
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));

        Self {
            sender,
            listeners: RwLock::new(Vec::new()),
            stats: RwLock::new(EventStats::default()),
        }
    }

    /// 发布事件
    pub fn emit(&self, event: DashboardEvent) {
        debug!("Emitting event: {}", event.event_type());

        {
            let mut stats = self.stats.write();
            stats.total_events += 1;
            *stats
                .events_by_type
                .entry(event.event_type().to_string())
                .or_insert(0) += 1;
        }

        // 无订阅者时 send 会失败，属正常场景（无 UI 的调用方）
        if let Err(e) = self.sender.send(event.clone()) {
            debug!("Failed to broadcast event (no active receivers): {}", e);
        }

        let listeners = self.listeners.read();
        for listener in listeners.iter() {
            listener(&event);
        }
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }

    /// 添加同步监听器
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&DashboardEvent) + Send + Sync + 'static,
    {
        let count = {
            let mut listeners = self.listeners.write();
            listeners.push(Box::new(listener));
            listeners.len()
        };
        self.stats.write().listener_count = count;
        info!("Added dashboard event listener ({} total)", count);
    }

    /// 移除所有监听器
    pub fn clear_listeners(&self) {
        self.listeners.write().clear();
        self.stats.write().listener_count = 0;
        info!("Cleared all dashboard event listeners");
    }

    /// 获取事件统计
    pub fn get_stats(&self) -> EventStats {
        self.stats.read().clone()
    }

    /// 获取活跃订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("subscribers", &self.sender.receiver_count())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
