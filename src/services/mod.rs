// src/services/mod.rs

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::AppResult,
    events::{EventBus, Subscription},
    models::{item::Item, user::CurrentUser},
    store::ItemStore,
};

pub mod lifecycle;
pub mod query;
pub mod stats;
pub mod views;

use query::{ItemFilter, ItemQuery, Page};
use stats::ItemStats;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Entry point for every lost & found operation.
///
/// Writes go through the lifecycle controller (`lifecycle.rs`), reads
/// through the query engine. Every store call is bounded by `timeout`; expiry
/// surfaces as `AppError::Unavailable`.
#[derive(Clone)]
pub struct LostFoundService {
    store: Arc<dyn ItemStore>,
    events: EventBus,
    timeout: Duration,
    soft_delete: bool,
}

impl LostFoundService {
    pub fn new(store: Arc<dyn ItemStore>, events: EventBus) -> Self {
        Self {
            store,
            events,
            timeout: DEFAULT_TIMEOUT,
            soft_delete: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Makes `remove` hide items instead of deleting them.
    pub fn with_soft_delete(mut self, soft_delete: bool) -> Self {
        self.soft_delete = soft_delete;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    async fn call<T>(&self, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        tokio::time::timeout(self.timeout, fut).await?
    }

    /// Filtered, sorted, paginated listing.
    pub async fn list(&self, query: &ItemQuery) -> AppResult<Page> {
        self.call(self.store.find(query)).await
    }

    /// Everything the caller has reported, newest first.
    pub async fn my_items(&self, user: &CurrentUser) -> AppResult<Vec<Item>> {
        self.call(self.store.list_by_reporter(&user.id)).await
    }

    pub async fn compute_stats(&self) -> AppResult<ItemStats> {
        self.call(self.store.stats()).await
    }

    /// Live view of the items matching `filter`; see [`EventBus::watch`].
    pub fn watch(&self, filter: ItemFilter) -> Subscription {
        self.events.watch(self.store.clone(), filter)
    }
}
