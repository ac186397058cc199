// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// User account stored in the document store.
///
/// Holds credential material, so it is never serialized into an API
/// response. Use [`PublicUser`] for that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account ID (also used as document ID)
    pub id: Uuid,
    /// Unique, lowercase handle
    pub username: String,
    /// Unique email address
    pub email: String,
    pub full_name: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Avatar image URL
    pub avatar: String,
    /// Cover image URL
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Watched video IDs, most relevant first
    #[serde(default)]
    pub watch_history: Vec<Uuid>,
    /// The one refresh token currently honoured for this user
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as returned by the API: no password hash, no refresh token.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub watch_history: Vec<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            watch_history: user.watch_history.clone(),
            created_at: crate::time_utils::format_utc_rfc3339(user.created_at),
            updated_at: crate::time_utils::format_utc_rfc3339(user.updated_at),
        }
    }
}

/// Minimal owner/author projection embedded in video, comment and like listings.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OwnerProfile {
    pub full_name: String,
    pub username: String,
    pub avatar: String,
}

impl From<&User> for OwnerProfile {
    fn from(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}
