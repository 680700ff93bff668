// src/services/stats.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::item::{Item, ItemStatus, ItemType};

/// Dashboard counters over active items.
///
/// `resolved` deliberately includes claimed items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemStats {
    pub total: u64,
    pub lost: u64,
    pub found: u64,
    pub pending: u64,
    pub resolved: u64,
}

/// Counts active items. Hidden (`is_active = false`) items are not counted,
/// matching what the listing shows.
pub fn tally(items: &[Item]) -> ItemStats {
    items
        .iter()
        .filter(|item| item.is_active)
        .fold(ItemStats::default(), |mut stats, item| {
            stats.total += 1;
            match item.item_type {
                ItemType::Lost => stats.lost += 1,
                ItemType::Found => stats.found += 1,
            }
            match item.status {
                ItemStatus::Pending => stats.pending += 1,
                ItemStatus::Claimed | ItemStatus::Resolved => stats.resolved += 1,
                ItemStatus::Approved | ItemStatus::Rejected => {}
            }
            stats
        })
}
