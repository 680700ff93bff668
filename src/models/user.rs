// src/models/user.rs

use serde::{Deserialize, Serialize};

use super::item::ContactInfo;

pub const ADMIN_ROLE: &str = "admin";

/// The authenticated caller, as vouched for by the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    /// Display name, snapshotted onto items the user reports.
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// 'admin' or any other role string.
    pub role: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    pub fn contact_info(&self) -> ContactInfo {
        ContactInfo {
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}
