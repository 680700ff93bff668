// src/store/mod.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        item::{Item, ItemStatus},
        request::{ItemPatch, NewItem},
    },
    services::{
        query::{self, ItemFilter, ItemQuery, Page, SortField, SortOrder},
        stats::{self, ItemStats},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryItemStore;
pub use postgres::PgItemStore;

/// A status-guarded patch found the item in another status than it was planned against.
pub(crate) fn status_conflict(id: Uuid, expected: ItemStatus) -> AppError {
    AppError::Validation(format!(
        "Item {} is no longer '{}'; reload it and retry the status change",
        id, expected
    ))
}

/// Persistence seam for lost & found items.
///
/// Backends must validate `NewItem`/`ItemPatch` before writing, merge
/// patches field by field, refresh `updated_at` on every mutation and keep
/// `claimed_at`/`resolved_at` write-once. The listing, per-reporter and
/// stats methods have in-memory defaults over `list_all`; backends that can
/// push those down to the database should override them.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn create(&self, input: NewItem) -> AppResult<Item>;

    /// Fails with `NotFound` if the id is unknown.
    async fn get_by_id(&self, id: Uuid) -> AppResult<Item>;

    /// Every stored item, active or not, in no particular order.
    async fn list_all(&self) -> AppResult<Vec<Item>>;

    /// Refuses with `Validation` when `patch.expected_status` no longer
    /// matches the stored status.
    async fn update(&self, id: Uuid, patch: ItemPatch) -> AppResult<Item>;

    /// Removes the record permanently.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Atomically adds one to `view_count`.
    async fn increment_views(&self, id: Uuid) -> AppResult<Item>;

    async fn find(&self, query: &ItemQuery) -> AppResult<Page> {
        Ok(query::run(self.list_all().await?, query))
    }

    /// Full matching set for `filter`, newest first, without paging.
    async fn find_matching(&self, filter: &ItemFilter) -> AppResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect();
        items.sort_by(|a, b| query::compare_items(a, b, SortField::CreatedAt, SortOrder::Desc));
        Ok(items)
    }

    /// Items reported by `user_id`, active or not, newest first.
    async fn list_by_reporter(&self, user_id: &str) -> AppResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|item| item.is_reported_by(user_id))
            .collect();
        items.sort_by(|a, b| query::compare_items(a, b, SortField::CreatedAt, SortOrder::Desc));
        Ok(items)
    }

    async fn stats(&self) -> AppResult<ItemStats> {
        Ok(stats::tally(&self.list_all().await?))
    }
}
