// src/models/request.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::item::{Category, ContactInfo, ItemStatus, ItemType, Priority};

static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").expect("valid regex"));

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://\S+\.(jpg|jpeg|png|gif)$").expect("valid regex")
});

const MAX_IMAGES: usize = 10;
const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 30;

/// Phone numbers are stored as exactly ten digits.
pub(crate) fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    if !PHONE.is_match(phone) {
        return Err(validator::ValidationError::new("invalid_phone")
            .with_message("phone must be exactly 10 digits".into()));
    }
    Ok(())
}

/// Every image must be an http(s) URL pointing at a jpg/jpeg/png/gif.
fn validate_image_urls(urls: &[String]) -> Result<(), validator::ValidationError> {
    if urls.len() > MAX_IMAGES {
        return Err(validator::ValidationError::new("too_many_images"));
    }
    for url in urls {
        if !IMAGE_URL.is_match(url) {
            return Err(validator::ValidationError::new("invalid_image_url")
                .with_message(format!("'{}' is not a valid image URL", url).into()));
        }
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), validator::ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(validator::ValidationError::new("too_many_tags"));
    }
    if tags.iter().any(|tag| tag.chars().count() > MAX_TAG_LEN) {
        return Err(validator::ValidationError::new("tag_too_long"));
    }
    Ok(())
}

/// Trims, lowercases and de-duplicates tags, dropping empty ones.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Body of `POST /api/lostfound`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(rename = "type")]
    pub item_type: ItemType,

    #[validate(length(min = 1, max = 100, message = "itemName must be 1-100 characters"))]
    pub item_name: String,

    pub category: Category,

    #[validate(length(min = 1, max = 200, message = "location must be 1-200 characters"))]
    pub location: String,

    #[validate(length(min = 1, max = 500, message = "description must be 1-500 characters"))]
    pub description: String,

    #[serde(default)]
    #[validate(custom(function = validate_image_urls))]
    pub images: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = validate_tags))]
    pub tags: Vec<String>,

    #[serde(default)]
    pub priority: Priority,
}

/// Fully-resolved record handed to the store on creation.
///
/// The store validates this again so every backend enforces the same limits.
#[derive(Debug, Clone, Validate)]
pub struct NewItem {
    pub item_type: ItemType,
    #[validate(length(min = 1, max = 100, message = "itemName must be 1-100 characters"))]
    pub item_name: String,
    pub category: Category,
    #[validate(length(min = 1, max = 200, message = "location must be 1-200 characters"))]
    pub location: String,
    #[validate(length(min = 1, max = 500, message = "description must be 1-500 characters"))]
    pub description: String,
    #[validate(length(min = 1, message = "reportedBy is required"))]
    pub reported_by: String,
    pub reported_by_name: String,
    #[validate(nested)]
    pub contact_info: ContactInfo,
    #[validate(custom(function = validate_image_urls))]
    pub images: Vec<String>,
    #[validate(custom(function = validate_tags))]
    pub tags: Vec<String>,
    pub priority: Priority,
}

/// Body of `PUT /api/lostfound/{id}` as received.
///
/// Never applied directly: it is narrowed into an [`ItemUpdate`] for the
/// acting user first, and keys that user may not write are dropped.
/// `type` is not listed and therefore ignored. Admin-only keys are
/// validated by the store once they survive narrowing.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 100, message = "itemName must be 1-100 characters"))]
    pub item_name: Option<String>,
    pub category: Option<Category>,
    #[validate(length(min = 1, max = 200, message = "location must be 1-200 characters"))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 500, message = "description must be 1-500 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = validate_image_urls))]
    pub images: Option<Vec<String>>,
    #[validate(custom(function = validate_tags))]
    pub tags: Option<Vec<String>>,
    pub priority: Option<Priority>,

    pub status: Option<ItemStatus>,
    pub admin_notes: Option<String>,
    pub claimed_by: Option<String>,
    pub is_active: Option<bool>,
}

/// Fields the reporter of an item may change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReporterUpdate {
    pub item_name: Option<String>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub priority: Option<Priority>,
}

/// Fields an administrator may change: everything a reporter can, plus moderation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminUpdate {
    pub fields: ReporterUpdate,
    pub status: Option<ItemStatus>,
    pub admin_notes: Option<String>,
    pub claimed_by: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemUpdate {
    Reporter(ReporterUpdate),
    Admin(AdminUpdate),
}

impl UpdateItemRequest {
    /// Names of the admin-only keys present in this request.
    pub fn admin_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.status.is_some() {
            keys.push("status");
        }
        if self.admin_notes.is_some() {
            keys.push("adminNotes");
        }
        if self.claimed_by.is_some() {
            keys.push("claimedBy");
        }
        if self.is_active.is_some() {
            keys.push("isActive");
        }
        keys
    }

    pub fn into_reporter_update(self) -> ReporterUpdate {
        self.into_admin_update().fields
    }

    pub fn into_admin_update(self) -> AdminUpdate {
        AdminUpdate {
            fields: ReporterUpdate {
                item_name: self.item_name,
                category: self.category,
                location: self.location,
                description: self.description,
                images: self.images,
                tags: self.tags,
                priority: self.priority,
            },
            status: self.status,
            admin_notes: self.admin_notes,
            claimed_by: self.claimed_by,
            is_active: self.is_active,
        }
    }
}

/// Partial, field-level change set applied by a store.
///
/// `None` leaves a column untouched. `claimed_at`/`resolved_at` are only
/// written when the stored value is still empty. When `expected_status` is
/// set, the store refuses the write unless the stored status still equals it.
#[derive(Debug, Clone, Default, Validate)]
pub struct ItemPatch {
    #[validate(length(min = 1, max = 100, message = "itemName must be 1-100 characters"))]
    pub item_name: Option<String>,
    pub category: Option<Category>,
    #[validate(length(min = 1, max = 200, message = "location must be 1-200 characters"))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 500, message = "description must be 1-500 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = validate_image_urls))]
    pub images: Option<Vec<String>>,
    #[validate(custom(function = validate_tags))]
    pub tags: Option<Vec<String>>,
    pub priority: Option<Priority>,
    pub status: Option<ItemStatus>,
    #[validate(length(max = 500, message = "adminNotes must be at most 500 characters"))]
    pub admin_notes: Option<String>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub expected_status: Option<ItemStatus>,
}

impl From<ReporterUpdate> for ItemPatch {
    fn from(update: ReporterUpdate) -> Self {
        Self {
            item_name: update.item_name.map(|name| name.trim().to_string()),
            category: update.category,
            location: update.location.map(|location| location.trim().to_string()),
            description: update.description.map(|description| description.trim().to_string()),
            images: update.images,
            tags: update.tags.map(normalize_tags),
            priority: update.priority,
            ..Default::default()
        }
    }
}

/// Raw listing query string. Everything arrives as text so malformed paging
/// values can be clamped instead of rejected.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// `lost`, `found` or `all`.
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item() -> NewItem {
        NewItem {
            item_type: ItemType::Lost,
            item_name: "Blue Backpack".into(),
            category: Category::Bag,
            location: "Library".into(),
            description: "Navy blue backpack left near entrance".into(),
            reported_by: "u1".into(),
            reported_by_name: "User One".into(),
            contact_info: ContactInfo {
                email: "u1@campus.edu".into(),
                phone: Some("0123456789".into()),
            },
            images: vec!["https://cdn.campus.edu/bag.JPG".into()],
            tags: vec!["bag".into()],
            priority: Priority::Medium,
        }
    }

    #[test]
    fn valid_new_item_passes() {
        assert!(new_item().validate().is_ok());
    }

    #[test]
    fn rejects_bad_phone_and_image() {
        let mut item = new_item();
        item.contact_info.phone = Some("12345".into());
        item.images = vec!["ftp://cdn.campus.edu/bag.bmp".into()];

        let errors = item.validate().unwrap_err().to_string();
        assert!(errors.contains("phone"), "{errors}");
        assert!(errors.contains("images"), "{errors}");
    }

    #[test]
    fn rejects_overlong_fields() {
        let mut item = new_item();
        item.item_name = "x".repeat(101);
        item.description = "y".repeat(501);

        let errors = item.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("item_name"));
        assert!(fields.contains_key("description"));
        assert!(!fields.contains_key("location"));
    }

    #[test]
    fn tags_are_trimmed_lowercased_and_deduplicated() {
        let tags = normalize_tags(vec![
            "  Blue ".into(),
            "blue".into(),
            "".into(),
            "BAG".into(),
        ]);
        assert_eq!(tags, vec!["blue".to_string(), "bag".to_string()]);
    }

    #[test]
    fn narrowing_to_reporter_drops_admin_keys() {
        let request = UpdateItemRequest {
            description: Some("edited".into()),
            status: Some(ItemStatus::Resolved),
            admin_notes: Some("note".into()),
            ..Default::default()
        };
        assert_eq!(request.admin_keys(), vec!["status", "adminNotes"]);

        let update = request.into_reporter_update();
        assert_eq!(update.description.as_deref(), Some("edited"));

        let patch = ItemPatch::from(update);
        assert!(patch.status.is_none());
        assert!(patch.admin_notes.is_none());
    }

    #[test]
    fn reporter_text_fields_are_trimmed_like_on_create() {
        let patch = ItemPatch::from(ReporterUpdate {
            item_name: Some("  Blue Backpack ".into()),
            location: Some(" Library\n".into()),
            ..Default::default()
        });
        assert_eq!(patch.item_name.as_deref(), Some("Blue Backpack"));
        assert_eq!(patch.location.as_deref(), Some("Library"));

        let blank = ItemPatch::from(ReporterUpdate {
            item_name: Some("   ".into()),
            ..Default::default()
        });
        assert!(blank.validate().is_err());
    }
}
