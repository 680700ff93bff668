// src/events.rs

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{models::item::Item, services::query::ItemFilter, store::ItemStore};

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Outbound notification for the real-time push collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ItemEvent {
    ItemCreated { item: Box<Item>, message: String },
    /// Only emitted when the status changed.
    ItemUpdated { item: Box<Item>, message: String },
    ItemDeleted { id: Uuid, message: String },
}

impl ItemEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ItemEvent::ItemCreated { .. } => "item-created",
            ItemEvent::ItemUpdated { .. } => "item-updated",
            ItemEvent::ItemDeleted { .. } => "item-deleted",
        }
    }

    pub fn item_id(&self) -> Uuid {
        match self {
            ItemEvent::ItemCreated { item, .. } | ItemEvent::ItemUpdated { item, .. } => item.id,
            ItemEvent::ItemDeleted { id, .. } => *id,
        }
    }
}

/// Pub/sub hub owned by the service and injected where needed.
///
/// Two channels: `events` carries the outbound notifications, `changes`
/// carries the id of every mutated item (views included) and drives live
/// subscriptions.
#[derive(Debug, Clone)]
pub struct EventBus {
    events: broadcast::Sender<ItemEvent>,
    changes: broadcast::Sender<Uuid>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        let (changes, _) = broadcast::channel(capacity);
        Self { events, changes }
    }

    pub fn publish(&self, event: ItemEvent) {
        tracing::debug!(event = event.name(), item_id = %event.item_id(), "Publishing item event");
        // No receivers is not an error: nobody is listening yet.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.events.subscribe()
    }

    pub fn notify_change(&self, id: Uuid) {
        let _ = self.changes.send(id);
    }

    /// Registers a live subscription over `filter`.
    ///
    /// The subscription first receives the current matching set, then the
    /// full matching set again after every change to the collection. A failed
    /// store read is retried with exponential backoff. Dropping the returned
    /// handle cancels it.
    pub fn watch(&self, store: Arc<dyn ItemStore>, filter: ItemFilter) -> Subscription {
        let mut changes = self.changes.subscribe();
        let (tx, rx) = watch::channel(Vec::new());

        let task = tokio::spawn(async move {
            loop {
                let Some(items) = refresh(store.as_ref(), &filter, &tx).await else {
                    break;
                };
                if tx.send(items).is_err() {
                    break;
                }

                match changes.recv().await {
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Subscription lagged, resyncing");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Subscription { rx, task }
    }
}

/// Loads the matching set, backing off between failed attempts. Returns
/// `None` once the subscriber is gone.
async fn refresh(
    store: &dyn ItemStore,
    filter: &ItemFilter,
    tx: &watch::Sender<Vec<Item>>,
) -> Option<Vec<Item>> {
    let mut delay = INITIAL_BACKOFF;
    loop {
        match store.find_matching(filter).await {
            Ok(items) => return Some(items),
            Err(e) => {
                tracing::warn!("Subscription refresh failed, retrying in {:?}: {}", delay, e);
                if tx.is_closed() {
                    return None;
                }
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_BACKOFF);
            }
        }
    }
}

/// Handle to a live subscription. Cancels on drop.
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<Vec<Item>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Waits for the next snapshot. Returns `false` once the subscription has ended.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Latest snapshot of the matching set.
    pub fn current(&self) -> Vec<Item> {
        self.rx.borrow().clone()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::{
        models::item::{Category, ContactInfo, ItemType, Priority},
        models::request::NewItem,
        store::MemoryItemStore,
    };

    fn new_item(item_type: ItemType) -> NewItem {
        NewItem {
            item_type,
            item_name: "Calculator".into(),
            category: Category::Electronics,
            location: "Room 101".into(),
            description: "Graphing calculator".into(),
            reported_by: "u1".into(),
            reported_by_name: "User One".into(),
            contact_info: ContactInfo {
                email: "u1@campus.edu".into(),
                phone: None,
            },
            images: vec![],
            tags: vec![],
            priority: Priority::Low,
        }
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let id = Uuid::new_v4();
        bus.publish(ItemEvent::ItemDeleted {
            id,
            message: "gone".into(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "item-deleted");
        assert_eq!(event.item_id(), id);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        EventBus::default().publish(ItemEvent::ItemDeleted {
            id: Uuid::new_v4(),
            message: "gone".into(),
        });
    }

    #[tokio::test]
    async fn watch_delivers_full_matching_set_after_each_change() {
        let store = Arc::new(MemoryItemStore::new());
        let bus = EventBus::default();
        let filter = ItemFilter {
            item_type: Some(ItemType::Lost),
            ..Default::default()
        };
        let mut sub = bus.watch(store.clone(), filter);

        assert!(timeout(Duration::from_secs(1), sub.changed()).await.unwrap());
        assert!(sub.current().is_empty());

        let lost = store.create(new_item(ItemType::Lost)).await.unwrap();
        bus.notify_change(lost.id);
        let found = store.create(new_item(ItemType::Found)).await.unwrap();
        bus.notify_change(found.id);

        timeout(Duration::from_secs(1), async {
            loop {
                let current = sub.current();
                if current.len() == 1 && current[0].id == lost.id {
                    break;
                }
                assert!(sub.changed().await);
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn cancel_stops_the_subscription_task() {
        let store = Arc::new(MemoryItemStore::new());
        let bus = EventBus::default();
        let sub = bus.watch(store, ItemFilter::default());
        sub.cancel();

        // Nothing is listening anymore, sends must not fail or block.
        bus.notify_change(Uuid::new_v4());
    }
}
