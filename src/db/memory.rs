// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process entity store.
//!
//! Tables are `DashMap`s keyed by ID. IDs come from per-table atomic
//! sequences starting at 1, so ID order is insertion order. The leaderboard
//! is an `Arc` snapshot swapped under a lock; readers clone the `Arc` and
//! always see one complete generation.

use crate::error::{AppError, Result};
use crate::models::{
    Activity, LeaderboardEntry, LeaderboardSnapshot, NewActivity, NewTeam, NewUser, NewWorkout,
    RankedTotal, Team, User, Workout,
};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Default)]
struct Sequence(AtomicU64);

impl Sequence {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// In-memory backend for `Db`.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<u64, User>,
    /// username -> user ID
    usernames: DashMap<String, u64>,
    /// email -> user ID
    emails: DashMap<String, u64>,
    teams: DashMap<u64, Team>,
    activities: DashMap<u64, Activity>,
    workouts: DashMap<u64, Workout>,
    leaderboard: RwLock<Arc<LeaderboardSnapshot>>,

    user_ids: Sequence,
    team_ids: Sequence,
    activity_ids: Sequence,
    workout_ids: Sequence,
    entry_ids: Sequence,
}

/// Clone every value out of a table, ordered by ID.
fn sorted_values<T: Clone>(table: &DashMap<u64, T>) -> Vec<T> {
    let mut rows: Vec<(u64, T)> = table
        .iter()
        .map(|r| (*r.key(), r.value().clone()))
        .collect();
    rows.sort_by_key(|(id, _)| *id);
    rows.into_iter().map(|(_, v)| v).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Users ───────────────────────────────────────────────────

    pub fn create_user(&self, new: NewUser) -> Result<User> {
        let id = self.user_ids.next();

        match self.usernames.entry(new.username.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "username '{}' is already taken",
                    new.username
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        match self.emails.entry(new.email.clone()) {
            Entry::Occupied(_) => {
                self.usernames.remove(&new.username);
                return Err(AppError::Conflict(format!(
                    "email '{}' is already registered",
                    new.email
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let user = User {
            id,
            username: new.username,
            name: new.name,
            email: new.email,
            password: new.password,
            team_id: new.team_id,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn get_user(&self, id: u64) -> Option<User> {
        self.users.get(&id).map(|u| u.value().clone())
    }

    pub fn list_users(&self) -> Vec<User> {
        sorted_values(&self.users)
    }

    // ─── Teams ───────────────────────────────────────────────────

    pub fn create_team(&self, new: NewTeam) -> Team {
        let team = Team {
            id: self.team_ids.next(),
            name: new.name,
            description: new.description,
            created_at: Utc::now(),
        };
        self.teams.insert(team.id, team.clone());
        team
    }

    pub fn get_team(&self, id: u64) -> Option<Team> {
        self.teams.get(&id).map(|t| t.value().clone())
    }

    pub fn list_teams(&self) -> Vec<Team> {
        sorted_values(&self.teams)
    }

    // ─── Activities ──────────────────────────────────────────────

    pub fn create_activity(&self, new: NewActivity) -> Activity {
        let activity = Activity {
            id: self.activity_ids.next(),
            user_id: new.user_id,
            activity_type: new.activity_type,
            duration: new.duration,
            calories_burned: new.calories_burned,
            date: new.date,
            created_at: Utc::now(),
        };
        self.activities.insert(activity.id, activity.clone());
        activity
    }

    pub fn get_activity(&self, id: u64) -> Option<Activity> {
        self.activities.get(&id).map(|a| a.value().clone())
    }

    pub fn list_activities(&self, user_id: Option<u64>) -> Vec<Activity> {
        let mut activities = sorted_values(&self.activities);
        if let Some(user_id) = user_id {
            activities.retain(|a| a.user_id == user_id);
        }
        activities
    }

    pub fn delete_activity(&self, id: u64) -> bool {
        self.activities.remove(&id).is_some()
    }

    pub fn sum_calories_for_user(&self, user_id: u64) -> u64 {
        self.activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| u64::from(a.calories_burned))
            .sum()
    }

    // ─── Workouts ────────────────────────────────────────────────

    pub fn create_workout(&self, new: NewWorkout) -> Workout {
        let workout = Workout {
            id: self.workout_ids.next(),
            name: new.name,
            description: new.description,
            difficulty: new.difficulty,
            duration: new.duration,
            category: new.category,
        };
        self.workouts.insert(workout.id, workout.clone());
        workout
    }

    pub fn get_workout(&self, id: u64) -> Option<Workout> {
        self.workouts.get(&id).map(|w| w.value().clone())
    }

    pub fn list_workouts(&self) -> Vec<Workout> {
        sorted_values(&self.workouts)
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    pub fn leaderboard(&self) -> Arc<LeaderboardSnapshot> {
        let guard = self
            .leaderboard
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new generation. Entries are built before the swap, so a
    /// reader sees either the old or the new snapshot, never a mix.
    pub fn replace_leaderboard(&self, ranked: &[RankedTotal]) -> Result<Arc<LeaderboardSnapshot>> {
        let mut current = self.leaderboard.write().map_err(|_| {
            AppError::Internal(anyhow::anyhow!("leaderboard lock poisoned"))
        })?;

        let generation = current.generation + 1;
        let now = Utc::now();
        let entries = ranked
            .iter()
            .map(|row| LeaderboardEntry {
                id: self.entry_ids.next(),
                user_id: row.user_id,
                total_points: row.total_points,
                rank: row.rank,
                generation,
                updated_at: now,
            })
            .collect();

        let snapshot = Arc::new(LeaderboardSnapshot {
            generation,
            computed_at: Some(now),
            entries,
        });
        *current = Arc::clone(&snapshot);

        Ok(snapshot)
    }

    // ─── Maintenance ─────────────────────────────────────────────

    pub fn clear_entities(&self) {
        self.activities.clear();
        self.workouts.clear();
        self.users.clear();
        self.usernames.clear();
        self.emails.clear();
        self.teams.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            name: username.to_uppercase(),
            email: email.to_string(),
            password: "secret".to_string(),
            team_id: None,
        }
    }

    fn new_activity(user_id: u64, calories: u32) -> NewActivity {
        NewActivity {
            user_id,
            activity_type: "Running".to_string(),
            duration: 30,
            calories_burned: calories,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a", "a@x.com")).unwrap();
        let b = store.create_user(new_user("b", "b@x.com")).unwrap();
        assert!(a.id < b.id);

        let listed: Vec<u64> = store.list_users().iter().map(|u| u.id).collect();
        assert_eq!(listed, vec![a.id, b.id]);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("thor", "thor@asgard.com")).unwrap();

        let err = store
            .create_user(new_user("thor", "other@asgard.com"))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.list_users().len(), 1);
    }

    #[test]
    fn test_duplicate_email_rejected_and_username_released() {
        let store = MemoryStore::new();
        store.create_user(new_user("thor", "thor@asgard.com")).unwrap();

        let err = store
            .create_user(new_user("loki", "thor@asgard.com"))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // The failed attempt must not keep "loki" reserved
        assert!(store.create_user(new_user("loki", "loki@asgard.com")).is_ok());
    }

    #[test]
    fn test_sum_calories_and_filter() {
        let store = MemoryStore::new();
        store.create_activity(new_activity(1, 100));
        store.create_activity(new_activity(1, 250));
        store.create_activity(new_activity(2, 40));

        assert_eq!(store.sum_calories_for_user(1), 350);
        assert_eq!(store.sum_calories_for_user(2), 40);
        assert_eq!(store.sum_calories_for_user(3), 0);
        assert_eq!(store.list_activities(Some(1)).len(), 2);
        assert_eq!(store.list_activities(None).len(), 3);
    }

    #[test]
    fn test_delete_activity() {
        let store = MemoryStore::new();
        let activity = store.create_activity(new_activity(1, 100));

        assert!(store.delete_activity(activity.id));
        assert!(!store.delete_activity(activity.id));
        assert!(store.get_activity(activity.id).is_none());
    }

    #[test]
    fn test_replace_leaderboard_bumps_generation() {
        let store = MemoryStore::new();
        assert_eq!(store.leaderboard().generation, 0);

        let ranked = [RankedTotal {
            user_id: 1,
            total_points: 500,
            rank: 1,
        }];
        let first = store.replace_leaderboard(&ranked).unwrap();
        let second = store.replace_leaderboard(&ranked).unwrap();

        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
        assert_ne!(first.entries[0].id, second.entries[0].id);
        assert_eq!(store.leaderboard().generation, 2);
    }

    #[test]
    fn test_old_snapshot_stays_valid_for_holders() {
        let store = MemoryStore::new();
        let ranked = [RankedTotal {
            user_id: 1,
            total_points: 10,
            rank: 1,
        }];
        store.replace_leaderboard(&ranked).unwrap();

        let held = store.leaderboard();
        store.replace_leaderboard(&[]).unwrap();

        assert_eq!(held.entries.len(), 1);
        assert!(store.leaderboard().entries.is_empty());
    }

    #[test]
    fn test_clear_entities_keeps_leaderboard() {
        let store = MemoryStore::new();
        store.create_user(new_user("a", "a@x.com")).unwrap();
        store.create_activity(new_activity(1, 5));
        store
            .replace_leaderboard(&[RankedTotal {
                user_id: 1,
                total_points: 5,
                rank: 1,
            }])
            .unwrap();

        store.clear_entities();

        assert!(store.list_users().is_empty());
        assert!(store.list_activities(None).is_empty());
        assert_eq!(store.leaderboard().entries.len(), 1);
        // Freed handles can be reused
        assert!(store.create_user(new_user("a", "a@x.com")).is_ok());
    }
}
