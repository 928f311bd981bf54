//! Database layer.
//!
//! `Db` is the single handle the rest of the application talks to. It
//! dispatches to either the in-memory store or Firestore, chosen at startup.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::{AppError, Result};
use crate::models::leaderboard::RankedTotal;
use crate::models::{
    Activity, LeaderboardSnapshot, NewActivity, NewTeam, NewUser, NewWorkout, Team, User, Workout,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TEAMS: &str = "teams";
    pub const ACTIVITIES: &str = "activities";
    pub const WORKOUTS: &str = "workouts";
    /// Leaderboard entries of every live generation
    pub const LEADERBOARD: &str = "leaderboard";
    /// Single `current` document pointing at the readable generation
    pub const LEADERBOARD_META: &str = "leaderboard_meta";
    /// Per-collection ID sequences
    pub const COUNTERS: &str = "counters";
    /// Username/email reservations enforcing uniqueness
    pub const USER_HANDLES: &str = "user_handles";
}

/// Entity store handle. Cheap to clone.
#[derive(Clone)]
pub struct Db {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Memory(Arc<MemoryStore>),
    Firestore(FirestoreDb),
}

impl Db {
    /// Fresh, empty in-memory store.
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    pub fn firestore(db: FirestoreDb) -> Self {
        Self {
            backend: Backend::Firestore(db),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Memory(_) => "memory",
            Backend::Firestore(_) => "firestore",
        }
    }

    // ─── Users ───────────────────────────────────────────────────

    /// Insert a user. Fails with `Conflict` if the username or email is taken.
    pub async fn create_user(&self, new: NewUser) -> Result<User> {
        match &self.backend {
            Backend::Memory(m) => m.create_user(new),
            Backend::Firestore(f) => f.create_user(new).await,
        }
    }

    pub async fn get_user(&self, id: u64) -> Result<Option<User>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.get_user(id)),
            Backend::Firestore(f) => f.get_user(id).await,
        }
    }

    /// All users, ordered by ID.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.list_users()),
            Backend::Firestore(f) => f.list_users().await,
        }
    }

    // ─── Teams ───────────────────────────────────────────────────

    pub async fn create_team(&self, new: NewTeam) -> Result<Team> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.create_team(new)),
            Backend::Firestore(f) => f.create_team(new).await,
        }
    }

    pub async fn get_team(&self, id: u64) -> Result<Option<Team>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.get_team(id)),
            Backend::Firestore(f) => f.get_team(id).await,
        }
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.list_teams()),
            Backend::Firestore(f) => f.list_teams().await,
        }
    }

    // ─── Activities ──────────────────────────────────────────────

    /// Insert an activity. The user ID is stored as-is, even if no such user exists.
    pub async fn create_activity(&self, new: NewActivity) -> Result<Activity> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.create_activity(new)),
            Backend::Firestore(f) => f.create_activity(new).await,
        }
    }

    pub async fn get_activity(&self, id: u64) -> Result<Option<Activity>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.get_activity(id)),
            Backend::Firestore(f) => f.get_activity(id).await,
        }
    }

    /// Activities ordered by ID, optionally restricted to one user.
    pub async fn list_activities(&self, user_id: Option<u64>) -> Result<Vec<Activity>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.list_activities(user_id)),
            Backend::Firestore(f) => f.list_activities(user_id).await,
        }
    }

    /// Delete an activity. Returns `false` if it did not exist.
    pub async fn delete_activity(&self, id: u64) -> Result<bool> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.delete_activity(id)),
            Backend::Firestore(f) => f.delete_activity(id).await,
        }
    }

    /// Live sum of `calories_burned` over a user's activities.
    pub async fn sum_calories_for_user(&self, user_id: u64) -> Result<u64> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.sum_calories_for_user(user_id)),
            Backend::Firestore(f) => f.sum_calories_for_user(user_id).await,
        }
    }

    // ─── Workouts ────────────────────────────────────────────────

    pub async fn create_workout(&self, new: NewWorkout) -> Result<Workout> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.create_workout(new)),
            Backend::Firestore(f) => f.create_workout(new).await,
        }
    }

    pub async fn get_workout(&self, id: u64) -> Result<Option<Workout>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.get_workout(id)),
            Backend::Firestore(f) => f.get_workout(id).await,
        }
    }

    pub async fn list_workouts(&self) -> Result<Vec<Workout>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.list_workouts()),
            Backend::Firestore(f) => f.list_workouts().await,
        }
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    /// The current complete leaderboard generation.
    pub async fn leaderboard(&self) -> Result<Arc<LeaderboardSnapshot>> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.leaderboard()),
            Backend::Firestore(f) => f.leaderboard().await.map(Arc::new),
        }
    }

    /// Replace the whole leaderboard with a new generation built from `ranked`.
    ///
    /// On error the previous generation stays current.
    pub async fn replace_leaderboard(
        &self,
        ranked: &[RankedTotal],
    ) -> Result<Arc<LeaderboardSnapshot>> {
        validate_ranking(ranked)?;
        match &self.backend {
            Backend::Memory(m) => m.replace_leaderboard(ranked),
            Backend::Firestore(f) => f.replace_leaderboard(ranked).await.map(Arc::new),
        }
    }

    // ─── Maintenance ─────────────────────────────────────────────

    /// Delete all users, teams, activities and workouts.
    ///
    /// The leaderboard is left alone; the next recompute replaces it.
    pub async fn clear_entities(&self) -> Result<()> {
        match &self.backend {
            Backend::Memory(m) => {
                m.clear_entities();
                Ok(())
            }
            Backend::Firestore(f) => f.clear_entities().await,
        }
    }
}

/// Reject rankings that would not form a well-formed leaderboard:
/// ranks must be exactly `1..=N` in order and each user may appear once.
pub(crate) fn validate_ranking(ranked: &[RankedTotal]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ranked.len());
    for (position, row) in ranked.iter().enumerate() {
        let expected = position as u32 + 1;
        if row.rank != expected {
            return Err(AppError::Internal(anyhow::anyhow!(
                "leaderboard rank {} at position {}, expected {}",
                row.rank,
                position,
                expected
            )));
        }
        if !seen.insert(row.user_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "user {} ranked more than once",
                row.user_id
            )));
        }
    }
    Ok(())
}
