// src/models/item.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Declares a closed string enum with its wire spelling, `as_str`, `Display`
/// and a `FromStr` that reports unknown values as validation errors.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::Validation(format!(
                        "Invalid {} '{}', expected one of: {}",
                        $label,
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

text_enum! {
    /// Whether the report is about something lost or something found.
    ItemType("type") {
        Lost => "lost",
        Found => "found",
    }
}

text_enum! {
    Category("category") {
        Electronics => "Electronics",
        Books => "Books",
        Bag => "Bag",
        Accessories => "Accessories",
        IdCard => "ID/Card",
        Clothing => "Clothing",
        Other => "Other",
    }
}

text_enum! {
    /// Lifecycle status. Transitions are enforced by the lifecycle controller.
    ItemStatus("status") {
        Pending => "pending",
        Approved => "approved",
        Claimed => "claimed",
        Resolved => "resolved",
        Rejected => "rejected",
    }
}

text_enum! {
    Priority("priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Pending
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    /// Ordinal used for sorting (low < medium < high).
    pub fn rank(&self) -> i32 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

/// Snapshot of the reporter's contact data taken when the item was reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ContactInfo {
    #[validate(email(message = "contactInfo.email must be a valid email address"))]
    pub email: String,

    #[validate(custom(function = crate::models::request::validate_phone))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A single lost-or-found report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    pub item_name: String,
    pub category: Category,
    pub location: String,
    pub description: String,

    /// Owner for authorization purposes.
    pub reported_by: String,
    pub reported_by_name: String,
    pub contact_info: ContactInfo,

    pub status: ItemStatus,
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    pub is_active: bool,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub view_count: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_reported_by(&self, user_id: &str) -> bool {
        self.reported_by == user_id
    }

    /// Case-insensitive substring match over name, location and description.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        [&self.item_name, &self.location, &self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_wire_spelling() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), *category);
        }
        assert_eq!("ID/Card".parse::<Category>().unwrap(), Category::IdCard);
        assert_eq!(
            serde_json::to_value(Category::IdCard).unwrap(),
            serde_json::json!("ID/Card")
        );
    }

    #[test]
    fn unknown_enum_value_is_a_validation_error() {
        let err = "misplaced".parse::<ItemStatus>().unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("status"));
                assert!(msg.contains("misplaced"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn defaults_match_new_report_state() {
        assert_eq!(ItemStatus::default(), ItemStatus::Pending);
        assert_eq!(Priority::default(), Priority::Medium);
        assert!(Priority::Low.rank() < Priority::High.rank());
    }
}
