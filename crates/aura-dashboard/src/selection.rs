//! 当前选择的实体
//!
//! 单写多读：只有 `select` 修改值。订阅方有两种：
//! - 同步监听器：在 `select` 返回前按注册顺序调用（TimelineSync 用这种）
//! - `watch` 接收端：给异步读取方（展示层）使用
//!
//! 不校验 id 是否在实体列表中，选择一个不存在的 id 是允许的。

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::debug;

use crate::events::{DashboardEvent, EventManager};
use crate::models::EntityId;

/// 选择监听器
pub type SelectionListener = Box<dyn Fn(Option<EntityId>) + Send + Sync>;

pub struct SelectionState {
    /// 串行化 `select`：写值与通知监听器作为一步完成
    dispatch: Mutex<()>,
    current: watch::Sender<Option<EntityId>>,
    listeners: RwLock<Vec<SelectionListener>>,
    events: Option<Arc<EventManager>>,
}

impl SelectionState {
    /// 初始为未选择
    pub fn new(events: Option<Arc<EventManager>>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            dispatch: Mutex::new(()),
            current,
            listeners: RwLock::new(Vec::new()),
            events,
        }
    }

    /// 设置当前选择并同步通知所有监听器
    ///
    /// 即使与当前值相同也会通知：再次选择同一实体就是用户触发的重新拉取。
    /// 并发调用按顺序完成，最后写入的值也是监听器最后收到的值。
    /// 监听器内部不能调用 `select` 或 `add_listener`。
    pub fn select(&self, selection: Option<EntityId>) {
        let _dispatch = self.dispatch.lock();
        let previous = self.current.send_replace(selection);
        debug!("🎯 选择变化: {:?} -> {:?}", previous, selection);

        if let Some(events) = &self.events {
            events.emit(DashboardEvent::SelectionChanged {
                previous,
                current: selection,
            });
        }

        for listener in self.listeners.read().iter() {
            listener(selection);
        }
    }

    /// 清除选择
    pub fn clear(&self) {
        self.select(None);
    }

    pub fn current(&self) -> Option<EntityId> {
        *self.current.borrow()
    }

    /// 注册同步监听器
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(Option<EntityId>) + Send + Sync + 'static,
    {
        self.listeners.write().push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// 订阅选择变化（异步读取方）
    pub fn subscribe(&self) -> watch::Receiver<Option<EntityId>> {
        self.current.subscribe()
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_selection_is_none() {
        let selection = SelectionState::default();
        assert_eq!(selection.current(), None);
    }

    #[test]
    fn test_select_notifies_synchronously_in_order() {
        let selection = SelectionState::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_first = seen.clone();
        selection.add_listener(move |id| seen_first.lock().push(("first", id)));
        let seen_second = seen.clone();
        selection.add_listener(move |id| seen_second.lock().push(("second", id)));

        selection.select(Some(1));
        // 返回前所有监听器都已执行
        assert_eq!(
            *seen.lock(),
            vec![("first", Some(1)), ("second", Some(1))]
        );

        selection.clear();
        assert_eq!(selection.current(), None);
        assert_eq!(seen.lock().len(), 4);
    }

    #[test]
    fn test_unknown_id_is_allowed_and_reselect_notifies() {
        let selection = SelectionState::default();
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        selection.add_listener(move |_| *count_clone.lock() += 1);

        selection.select(Some(999_999));
        selection.select(Some(999_999));
        assert_eq!(selection.current(), Some(999_999));
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_concurrent_selects_listener_sees_final_value() {
        for _ in 0..50 {
            let selection = Arc::new(SelectionState::default());
            let last_seen = Arc::new(Mutex::new(None));
            let last_seen_clone = last_seen.clone();
            selection.add_listener(move |id| *last_seen_clone.lock() = id);

            let threads: Vec<_> = (1..=4u64)
                .map(|id| {
                    let selection = selection.clone();
                    std::thread::spawn(move || {
                        for _ in 0..20 {
                            selection.select(Some(id));
                        }
                    })
                })
                .collect();
            for thread in threads {
                thread.join().unwrap();
            }

            assert_eq!(*last_seen.lock(), selection.current());
        }
    }

    #[tokio::test]
    async fn test_watch_subscriber_and_events() {
        let events = Arc::new(EventManager::new(8));
        let mut event_rx = events.subscribe();
        let selection = SelectionState::new(Some(events));
        let mut rx = selection.subscribe();

        selection.select(Some(5));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(5));

        assert_eq!(
            event_rx.recv().await.unwrap(),
            DashboardEvent::SelectionChanged {
                previous: None,
                current: Some(5)
            }
        );
    }
}
