// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Leaderboard snapshot and read models.
//!
//! The leaderboard is never patched in place. Every recompute produces a new
//! generation which replaces the previous one as a whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Output of the ranking step: one user's total and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedTotal {
    pub user_id: u64,
    pub total_points: u64,
    pub rank: u32,
}

/// One ranked row of a leaderboard generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Entry ID, unique across generations
    pub id: u64,
    pub user_id: u64,
    /// Sum of the user's calories burned at recompute time
    pub total_points: u64,
    /// 1-based position, no shared ranks
    pub rank: u32,
    /// Generation this entry belongs to
    pub generation: u64,
    pub updated_at: DateTime<Utc>,
}

/// A complete leaderboard generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardSnapshot {
    /// 0 until the first recompute
    pub generation: u64,
    pub computed_at: Option<DateTime<Utc>>,
    /// Ordered by rank
    pub entries: Vec<LeaderboardEntry>,
}

impl LeaderboardSnapshot {
    pub fn entry(&self, id: u64) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Denormalized user fields shown next to a leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct UserSnapshot {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub username: String,
    pub name: String,
}

/// Denormalized team fields shown next to a leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct TeamSnapshot {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
}

/// Leaderboard row as returned by the API.
///
/// `total_calories` is summed live from the activities collection, while
/// `total_points` is frozen at recompute time. The two drift apart whenever
/// activities change between recomputes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct LeaderboardResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub user: Option<UserSnapshot>,
    pub team: Option<TeamSnapshot>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_points: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_calories: u64,
    pub rank: u32,
    pub updated_at: DateTime<Utc>,
}
