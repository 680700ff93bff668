// src/services/query.rs

use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        item::{Category, Item, ItemStatus, ItemType},
        request::ListParams,
    },
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Predicate applied to every listing. Inactive items never match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub item_type: Option<ItemType>,
    pub category: Option<Category>,
    pub status: Option<ItemStatus>,
    /// Lowercased, trimmed search term.
    pub search: Option<String>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        if !item.is_active {
            return false;
        }
        if self.item_type.is_some_and(|t| t != item.item_type) {
            return false;
        }
        if self.category.is_some_and(|c| c != item.category) {
            return false;
        }
        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        match &self.search {
            Some(needle) => item.matches_search(needle),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    ItemName,
    Type,
    Category,
    Location,
    Status,
    Priority,
    ViewCount,
}

impl SortField {
    /// Unknown names fall back to `createdAt`.
    pub fn parse(name: &str) -> Self {
        match name {
            "updatedAt" => SortField::UpdatedAt,
            "itemName" => SortField::ItemName,
            "type" => SortField::Type,
            "category" => SortField::Category,
            "location" => SortField::Location,
            "status" => SortField::Status,
            "priority" => SortField::Priority,
            "viewCount" => SortField::ViewCount,
            _ => SortField::CreatedAt,
        }
    }

    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::ItemName => a.item_name.cmp(&b.item_name),
            SortField::Type => a.item_type.as_str().cmp(b.item_type.as_str()),
            SortField::Category => a.category.as_str().cmp(b.category.as_str()),
            SortField::Location => a.location.cmp(&b.location),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortField::ViewCount => a.view_count.cmp(&b.view_count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Only the literal `desc` sorts descending.
    pub fn parse(order: &str) -> Self {
        if order == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// A fully-parsed listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemQuery {
    pub filter: ItemFilter,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            filter: ItemFilter::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ItemQuery {
    /// Builds a query from raw query-string values.
    ///
    /// Paging values are clamped, never rejected: a non-numeric or
    /// non-positive `page` becomes 1, a non-numeric or non-positive `limit`
    /// becomes 10 and `limit` is capped at 100. Unknown enum values are
    /// validation errors, except `type=all` which disables the type filter.
    pub fn from_params(params: ListParams) -> AppResult<Self> {
        let item_type = match non_empty(params.item_type.as_deref()) {
            None | Some("all") => None,
            Some(raw) => Some(raw.parse::<ItemType>()?),
        };
        let category = non_empty(params.category.as_deref())
            .map(str::parse::<Category>)
            .transpose()?;
        let status = non_empty(params.status.as_deref())
            .map(str::parse::<ItemStatus>)
            .transpose()?;
        let search = non_empty(params.search.as_deref()).map(str::to_lowercase);

        Ok(Self {
            filter: ItemFilter {
                item_type,
                category,
                status,
                search,
            },
            page: parse_positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(params.limit.as_deref())
                .unwrap_or(DEFAULT_LIMIT)
                .min(MAX_LIMIT),
            sort_by: non_empty(params.sort_by.as_deref())
                .map(SortField::parse)
                .unwrap_or_default(),
            sort_order: non_empty(params.sort_order.as_deref())
                .map(SortOrder::parse)
                .unwrap_or_default(),
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n.min(i64::from(u32::MAX)) as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub current: u32,
    pub pages: u64,
    pub total: u64,
    pub limit: u32,
}

impl PaginationMeta {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            current: page,
            pages: total.div_ceil(u64::from(limit.max(1))),
            total,
            limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub pagination: PaginationMeta,
}

/// Orders two items by the requested field, breaking ties on id ascending
/// so page boundaries are stable.
pub fn compare_items(a: &Item, b: &Item, sort_by: SortField, order: SortOrder) -> Ordering {
    let primary = sort_by.compare(a, b);
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Filters, counts, sorts and slices an unordered item set.
pub fn run(items: Vec<Item>, query: &ItemQuery) -> Page {
    let mut matches: Vec<Item> = items
        .into_iter()
        .filter(|item| query.filter.matches(item))
        .collect();
    let total = matches.len() as u64;

    matches.sort_by(|a, b| compare_items(a, b, query.sort_by, query.sort_order));

    let items = matches
        .into_iter()
        .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
        .take(query.limit as usize)
        .collect();

    Page {
        items,
        pagination: PaginationMeta::new(query.page, query.limit, total),
    }
}
