// src/store/memory.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use super::{ItemStore, status_conflict};
use crate::{
    error::{AppError, AppResult},
    models::{
        item::{Item, ItemStatus},
        request::{ItemPatch, NewItem, normalize_tags},
    },
};

/// In-memory implementation of `ItemStore` (for development/testing).
#[derive(Debug, Default, Clone)]
pub struct MemoryItemStore {
    items: Arc<RwLock<HashMap<Uuid, Item>>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Item {} not found", id))
}

/// Merges `patch` into `item` field by field.
fn apply_patch(item: &mut Item, patch: ItemPatch, now: DateTime<Utc>) {
    if let Some(item_name) = patch.item_name {
        item.item_name = item_name;
    }
    if let Some(category) = patch.category {
        item.category = category;
    }
    if let Some(location) = patch.location {
        item.location = location;
    }
    if let Some(description) = patch.description {
        item.description = description;
    }
    if let Some(images) = patch.images {
        item.images = images;
    }
    if let Some(tags) = patch.tags {
        item.tags = tags;
    }
    if let Some(priority) = patch.priority {
        item.priority = priority;
    }
    if let Some(status) = patch.status {
        item.status = status;
    }
    if let Some(admin_notes) = patch.admin_notes {
        item.admin_notes = Some(admin_notes);
    }
    if let Some(claimed_by) = patch.claimed_by {
        item.claimed_by = Some(claimed_by);
    }
    if let Some(claimed_at) = patch.claimed_at {
        item.claimed_at.get_or_insert(claimed_at);
    }
    if let Some(resolved_at) = patch.resolved_at {
        item.resolved_at.get_or_insert(resolved_at);
    }
    if let Some(is_active) = patch.is_active {
        item.is_active = is_active;
    }
    item.updated_at = now;
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn create(&self, input: NewItem) -> AppResult<Item> {
        input.validate()?;

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            item_type: input.item_type,
            item_name: input.item_name,
            category: input.category,
            location: input.location,
            description: input.description,
            reported_by: input.reported_by,
            reported_by_name: input.reported_by_name,
            contact_info: input.contact_info,
            status: ItemStatus::Pending,
            images: input.images,
            admin_notes: None,
            claimed_by: None,
            claimed_at: None,
            resolved_at: None,
            is_active: true,
            priority: input.priority,
            tags: normalize_tags(input.tags),
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.items.write().await.insert(item.id, item.clone());

        tracing::info!(item_id = %item.id, "Created item");
        Ok(item)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Item> {
        self.items
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn list_all(&self) -> AppResult<Vec<Item>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn update(&self, id: Uuid, patch: ItemPatch) -> AppResult<Item> {
        patch.validate()?;

        let mut items = self.items.write().await;
        let item = items.get_mut(&id).ok_or_else(|| not_found(id))?;
        if let Some(expected) = patch.expected_status {
            if item.status != expected {
                return Err(status_conflict(id, expected));
            }
        }
        apply_patch(item, patch, Utc::now());

        tracing::info!(item_id = %id, "Updated item");
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        match self.items.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(item_id = %id, "Deleted item");
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<Item> {
        let mut items = self.items.write().await;
        let item = items.get_mut(&id).ok_or_else(|| not_found(id))?;
        item.view_count += 1;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }
}
