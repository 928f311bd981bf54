// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// User profile as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned ID (also used as document ID)
    pub id: u64,
    /// Unique handle
    pub username: String,
    /// Display name
    pub name: String,
    /// Unique email address
    pub email: String,
    /// Credential secret, opaque to the API
    pub password: String,
    /// Team membership (weak reference, may point at a deleted team)
    pub team_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub password: String,
    #[serde(default)]
    pub team_id: Option<u64>,
}

/// User as returned by the API. The password never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub team_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            team_id: user.team_id,
            created_at: user.created_at,
        }
    }
}
