// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Coarse authorization tier stored on the user record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AccessLevel {
    #[default]
    Basic,
    Admin,
}

impl AccessLevel {
    pub fn is_admin(self) -> bool {
        self == AccessLevel::Admin
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Basic => f.write_str("basic"),
            AccessLevel::Admin => f.write_str("admin"),
        }
    }
}

/// User record, stored as-is by every user store backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Opaque ID, assigned once at creation (also the document ID)
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Secondary lookup key
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Date of birth
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub dob: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub access_level: AccessLevel,
    /// Object store key of the profile photo, empty when unset
    #[serde(default, rename = "photoURL")]
    pub photo_url: String,
}

impl User {
    /// Build the record for a first-time Google login.
    pub fn from_google_login(first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            // Google only hands out verified addresses through this flow.
            verified_email: true,
            access_level: AccessLevel::Basic,
            ..Default::default()
        }
    }

    pub fn has_photo(&self) -> bool {
        !self.photo_url.is_empty()
    }
}
