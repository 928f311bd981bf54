// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard ranking pipeline.
//!
//! A recompute is a one-shot batch:
//! 1. Aggregate calories burned per user from all activities
//! 2. Rank users by total, highest first
//! 3. Replace the stored leaderboard with the new ranking
//!
//! Steps 1 and 2 are pure functions. Step 3 runs under a mutex so only one
//! recompute is in flight, and the store swaps generations atomically.

use crate::db::Db;
use crate::error::Result;
use crate::models::leaderboard::{TeamSnapshot, UserSnapshot};
use crate::models::{Activity, LeaderboardEntry, LeaderboardResponse, RankedTotal};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Upper bound on concurrent store lookups while enriching leaderboard rows.
const MAX_CONCURRENT_LOOKUPS: usize = 16;

/// A user's summed calories, before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTotal {
    pub user_id: u64,
    pub total_points: u64,
}

/// Result of the aggregation step.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// One row per known user, in the order the users were given
    pub totals: Vec<UserTotal>,
    /// Activities whose user ID matched no known user
    pub orphaned_activities: usize,
    pub orphaned_points: u64,
}

/// Sum `calories_burned` per user.
///
/// Every known user gets a row, 0 if they have no activities. Activities for
/// unknown users are counted in the orphan fields and otherwise ignored.
pub fn aggregate_points(user_ids: &[u64], activities: &[Activity]) -> Aggregation {
    let mut sums: HashMap<u64, u64> = HashMap::new();
    for activity in activities {
        *sums.entry(activity.user_id).or_insert(0) += u64::from(activity.calories_burned);
    }

    let known: HashSet<u64> = user_ids.iter().copied().collect();
    let orphaned_activities = activities
        .iter()
        .filter(|a| !known.contains(&a.user_id))
        .count();
    let orphaned_points = sums
        .iter()
        .filter(|(user_id, _)| !known.contains(*user_id))
        .map(|(_, points)| points)
        .sum();

    let totals = user_ids
        .iter()
        .map(|&user_id| UserTotal {
            user_id,
            total_points: sums.get(&user_id).copied().unwrap_or(0),
        })
        .collect();

    Aggregation {
        totals,
        orphaned_activities,
        orphaned_points,
    }
}

/// Order totals by points descending and number them from 1.
///
/// The sort is stable: users with equal points keep their input order and
/// get consecutive, distinct ranks.
pub fn rank_totals(totals: &[UserTotal]) -> Vec<RankedTotal> {
    let mut ordered = totals.to_vec();
    ordered.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    ordered
        .into_iter()
        .zip(1u32..)
        .map(|(total, rank)| RankedTotal {
            user_id: total.user_id,
            total_points: total.total_points,
            rank,
        })
        .collect()
}

/// Outcome of one recompute.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct RecomputeSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub generation: u64,
    pub users_ranked: usize,
    pub activities_counted: usize,
    pub orphaned_activities: usize,
    pub computed_at: Option<DateTime<Utc>>,
}

/// Runs recomputes and serves enriched leaderboard reads.
pub struct LeaderboardService {
    db: Db,
    recompute_lock: Mutex<()>,
}

impl LeaderboardService {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            recompute_lock: Mutex::new(()),
        }
    }

    /// Rebuild the leaderboard from the current users and activities.
    ///
    /// Concurrent callers queue behind each other. If the store rejects the
    /// new generation, the previous one stays in place.
    pub async fn recompute(&self) -> Result<RecomputeSummary> {
        let _guard = self.recompute_lock.lock().await;

        // Users come back ordered by ID, i.e. by insertion
        let users = self.db.list_users().await?;
        let user_ids: Vec<u64> = users.iter().map(|u| u.id).collect();
        let activities = self.db.list_activities(None).await?;

        let aggregation = aggregate_points(&user_ids, &activities);
        if aggregation.orphaned_activities > 0 {
            tracing::warn!(
                orphaned_activities = aggregation.orphaned_activities,
                orphaned_points = aggregation.orphaned_points,
                "Activities reference unknown users; left out of the leaderboard"
            );
        }

        let ranked = rank_totals(&aggregation.totals);
        let snapshot = self.db.replace_leaderboard(&ranked).await?;

        tracing::info!(
            generation = snapshot.generation,
            users = ranked.len(),
            activities = activities.len(),
            "Leaderboard recomputed"
        );

        Ok(RecomputeSummary {
            generation: snapshot.generation,
            users_ranked: ranked.len(),
            activities_counted: activities.len(),
            orphaned_activities: aggregation.orphaned_activities,
            computed_at: snapshot.computed_at,
        })
    }

    /// Current leaderboard with user/team details, ordered by rank.
    pub async fn entries(&self) -> Result<Vec<LeaderboardResponse>> {
        let snapshot = self.db.leaderboard().await?;

        stream::iter(snapshot.entries.iter().cloned())
            .map(|entry| self.enrich(entry))
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .try_collect()
            .await
    }

    /// One row of the current leaderboard, if the entry ID is in it.
    pub async fn entry(&self, id: u64) -> Result<Option<LeaderboardResponse>> {
        let snapshot = self.db.leaderboard().await?;
        match snapshot.entry(id) {
            Some(entry) => Ok(Some(self.enrich(entry.clone()).await?)),
            None => Ok(None),
        }
    }

    /// Attach user and team snapshots plus the live calorie total.
    /// Missing users or teams show up as `None`.
    async fn enrich(&self, entry: LeaderboardEntry) -> Result<LeaderboardResponse> {
        let user = self.db.get_user(entry.user_id).await?;

        let team = match user.as_ref().and_then(|u| u.team_id) {
            Some(team_id) => self.db.get_team(team_id).await?.map(|t| TeamSnapshot {
                id: t.id,
                name: t.name,
            }),
            None => None,
        };

        if user.is_none() {
            tracing::debug!(
                entry_id = entry.id,
                user_id = entry.user_id,
                "Leaderboard entry references a missing user"
            );
        }

        let total_calories = self.db.sum_calories_for_user(entry.user_id).await?;

        Ok(LeaderboardResponse {
            id: entry.id,
            user_id: entry.user_id,
            user: user.map(|u| UserSnapshot {
                id: u.id,
                username: u.username,
                name: u.name,
            }),
            team,
            total_points: entry.total_points,
            total_calories,
            rank: entry.rank,
            updated_at: entry.updated_at,
        })
    }
}
