// src/services/views.rs

use uuid::Uuid;

use super::LostFoundService;
use crate::{
    error::{AppError, AppResult},
    models::item::Item,
};

impl LostFoundService {
    /// Adds one to the item's view counter. Public, no authorization.
    pub async fn record_view(&self, id: Uuid) -> AppResult<Item> {
        let item = self.call(self.store.increment_views(id)).await?;
        self.events.notify_change(id);
        Ok(item)
    }

    /// Detail read: hidden items are reported as missing, visible ones
    /// are counted as viewed.
    pub async fn view_item(&self, id: Uuid) -> AppResult<Item> {
        let item = self.call(self.store.get_by_id(id)).await?;
        if !item.is_active {
            return Err(AppError::NotFound(format!("Item {} not found", id)));
        }
        self.record_view(id).await
    }
}
