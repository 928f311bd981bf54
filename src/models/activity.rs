// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Logged activity model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Stored activity record. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct Activity {
    /// Store-assigned ID (also used as document ID)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    /// Owner. Not checked against the users collection.
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    /// Running, Swimming, Cycling, ...
    pub activity_type: String,
    /// Duration in minutes
    pub duration: u32,
    pub calories_burned: u32,
    /// Calendar day the activity happened on
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Payload for logging an activity.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewActivity {
    pub user_id: u64,
    #[validate(length(min = 1, max = 50))]
    pub activity_type: String,
    #[validate(range(min = 1))]
    pub duration: u32,
    pub calories_burned: u32,
    pub date: NaiveDate,
}
