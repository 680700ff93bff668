// src/services/lifecycle.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::LostFoundService;
use crate::{
    error::{AppError, AppResult},
    events::ItemEvent,
    models::{
        item::{Item, ItemStatus},
        request::{
            AdminUpdate, CreateItemRequest, ItemPatch, ItemUpdate, NewItem, UpdateItemRequest,
            normalize_tags,
        },
        user::CurrentUser,
    },
};

/// Status state machine.
///
/// ```text
/// pending  -> approved | claimed | resolved | rejected
/// approved -> claimed | resolved | rejected
/// claimed  -> resolved
/// resolved, rejected: terminal
/// ```
/// Staying in the same status is always allowed.
pub fn transition_allowed(from: ItemStatus, to: ItemStatus) -> bool {
    use ItemStatus::*;

    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Pending, Approved | Claimed | Resolved | Rejected)
            | (Approved, Claimed | Resolved | Rejected)
            | (Claimed, Resolved)
    )
}

/// Narrows a raw update body to what `user` may write on `item`.
///
/// Administrators get the full field set. The reporter gets the reporter
/// fields; any admin-only keys they sent are dropped. Everyone else is
/// refused before anything is written.
pub fn authorize_update(
    user: &CurrentUser,
    item: &Item,
    request: UpdateItemRequest,
) -> AppResult<ItemUpdate> {
    if user.is_admin() {
        return Ok(ItemUpdate::Admin(request.into_admin_update()));
    }
    if !item.is_reported_by(&user.id) {
        return Err(AppError::Forbidden(
            "You are not authorized to update this item".to_string(),
        ));
    }

    let dropped = request.admin_keys();
    if !dropped.is_empty() {
        tracing::debug!(item_id = %item.id, user_id = %user.id, ?dropped, "Dropping admin-only fields");
    }
    Ok(ItemUpdate::Reporter(request.into_reporter_update()))
}

fn authorize_removal(user: &CurrentUser, item: &Item) -> AppResult<()> {
    if user.is_admin() || item.is_reported_by(&user.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not authorized to delete this item".to_string(),
        ))
    }
}

/// Turns an authorized update into a store patch, enforcing the state
/// machine and the claimed/resolved side effects.
pub fn plan_update(
    item: &Item,
    update: ItemUpdate,
    actor: &CurrentUser,
    now: DateTime<Utc>,
) -> AppResult<ItemPatch> {
    let admin = match update {
        ItemUpdate::Reporter(fields) => return Ok(ItemPatch::from(fields)),
        ItemUpdate::Admin(admin) => admin,
    };
    let AdminUpdate {
        fields,
        status,
        admin_notes,
        claimed_by,
        is_active,
    } = admin;

    let mut patch = ItemPatch::from(fields);
    patch.admin_notes = admin_notes;
    patch.is_active = is_active;

    let target = status.unwrap_or(item.status);
    if !transition_allowed(item.status, target) {
        return Err(AppError::Validation(format!(
            "Cannot change status from '{}' to '{}'",
            item.status, target
        )));
    }
    patch.status = status;
    patch.expected_status = status.map(|_| item.status);

    if target == ItemStatus::Claimed {
        if item.claimed_at.is_none() {
            patch.claimed_at = Some(now);
        }
        patch.claimed_by = if item.status == ItemStatus::Claimed {
            claimed_by
        } else {
            Some(claimed_by.unwrap_or_else(|| actor.id.clone()))
        };
    } else if claimed_by.is_some() {
        tracing::debug!(item_id = %item.id, "Ignoring claimedBy outside the claimed status");
    }
    if target == ItemStatus::Resolved && item.resolved_at.is_none() {
        patch.resolved_at = Some(now);
    }

    Ok(patch)
}

impl LostFoundService {
    /// Creates an item owned by `user`, snapshotting their name and contact data.
    pub async fn report(&self, user: &CurrentUser, request: CreateItemRequest) -> AppResult<Item> {
        let input = NewItem {
            item_type: request.item_type,
            item_name: request.item_name.trim().to_string(),
            category: request.category,
            location: request.location.trim().to_string(),
            description: request.description.trim().to_string(),
            reported_by: user.id.clone(),
            reported_by_name: user.name.clone(),
            contact_info: user.contact_info(),
            images: request.images,
            tags: normalize_tags(request.tags),
            priority: request.priority,
        };

        let item = self.call(self.store.create(input)).await?;
        tracing::info!(item_id = %item.id, user_id = %user.id, "Item reported");

        self.events.notify_change(item.id);
        self.events.publish(ItemEvent::ItemCreated {
            message: format!("New {} item reported: {}", item.item_type, item.item_name),
            item: Box::new(item.clone()),
        });
        Ok(item)
    }

    /// Applies the subset of `request` that `user` is allowed to write.
    pub async fn apply_update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        request: UpdateItemRequest,
    ) -> AppResult<Item> {
        let item = self.call(self.store.get_by_id(id)).await?;
        let update = authorize_update(user, &item, request)?;
        let patch = plan_update(&item, update, user, Utc::now())?;

        let updated = self.call(self.store.update(id, patch)).await?;
        tracing::info!(item_id = %id, user_id = %user.id, status = %updated.status, "Item updated");

        self.events.notify_change(id);
        if updated.status != item.status {
            self.events.publish(ItemEvent::ItemUpdated {
                message: format!("Item \"{}\" is now {}", updated.item_name, updated.status),
                item: Box::new(updated.clone()),
            });
        }
        Ok(updated)
    }

    /// Deletes (or hides, in soft-delete mode) an item. Reporter or admin only.
    pub async fn remove(&self, user: &CurrentUser, id: Uuid) -> AppResult<()> {
        let item = self.call(self.store.get_by_id(id)).await?;
        authorize_removal(user, &item)?;

        if self.soft_delete {
            let patch = ItemPatch {
                is_active: Some(false),
                ..Default::default()
            };
            self.call(self.store.update(id, patch)).await?;
        } else {
            self.call(self.store.delete(id)).await?;
        }
        tracing::info!(item_id = %id, user_id = %user.id, soft = self.soft_delete, "Item removed");

        self.events.notify_change(id);
        self.events.publish(ItemEvent::ItemDeleted {
            id,
            message: format!("Item \"{}\" was removed", item.item_name),
        });
        Ok(())
    }
}
