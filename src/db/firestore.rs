// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users, with username/email reservations in `user_handles`
//! - Teams, activities and workouts
//! - Leaderboard generations, published through a pointer document
//!
//! IDs are allocated from per-collection counter documents so that they stay
//! small integers and follow insertion order.

use crate::db::collections;
use crate::error::{AppError, Result};
use crate::models::{
    Activity, LeaderboardEntry, LeaderboardSnapshot, NewActivity, NewTeam, NewUser, NewWorkout,
    RankedTotal, Team, User, Workout,
};
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Document ID of the leaderboard pointer in `leaderboard_meta`.
const CURRENT_LEADERBOARD: &str = "current";

/// Last ID handed out for a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdCounter {
    last_id: u64,
}

/// Reservation of a username or email for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserHandle {
    user_id: u64,
}

/// Points readers at the generation they should read.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LeaderboardPointer {
    generation: u64,
    computed_at: DateTime<Utc>,
    /// Highest entry ID used so far
    last_entry_id: u64,
}

/// Document ID for a handle reservation. Firestore IDs may not contain `/`,
/// so it is percent-escaped along with `%` itself to keep the mapping one-to-one.
fn handle_doc_id(kind: &str, value: &str) -> String {
    format!(
        "{}:{}",
        kind,
        value.replace('%', "%25").replace('/', "%2F")
    )
}

fn entry_doc_id(entry: &LeaderboardEntry) -> String {
    format!("{}_{}", entry.generation, entry.rank)
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
    /// Held across the counter read and write in `allocate_id`
    id_lock: Arc<Mutex<()>>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client,
            id_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self {
            client,
            id_lock: Arc::new(Mutex::new(())),
        })
    }

    // ─── Generic Helpers ─────────────────────────────────────────

    /// Allocate the next ID for a collection.
    ///
    /// The read and the write of the counter happen under `id_lock`, so
    /// concurrent requests in this process never share an ID. Only one API
    /// process writes to a project.
    async fn allocate_id(&self, collection: &str) -> Result<u64> {
        let _guard = self.id_lock.lock().await;

        let current: Option<IdCounter> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::COUNTERS)
            .obj()
            .one(collection)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let next = IdCounter {
            last_id: current.map(|c| c.last_id).unwrap_or(0) + 1,
        };

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::COUNTERS)
            .document_id(collection)
            .object(&next)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add counter to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Counter commit failed: {}", e)))?;

        Ok(next.last_id)
    }

    async fn get_by_id<T>(&self, collection: &str, id: u64) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_all<T>(&self, collection: &str) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .from(collection)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn put<T>(&self, collection: &str, id: String, object: &T) -> Result<()>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(&self, items: &[T], collection: &str, id_extractor: F) -> Result<()>
    where
        F: Fn(&T) -> String,
    {
        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction =
                self.client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

            for item in chunk {
                let doc_id = id_extractor(item);
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Claim a username or email. Fails with `Conflict` if already claimed.
    async fn reserve_handle(&self, kind: &str, value: &str, user_id: u64) -> Result<()> {
        let result: std::result::Result<UserHandle, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USER_HANDLES)
            .document_id(handle_doc_id(kind, value))
            .object(&UserHandle { user_id })
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(AppError::Conflict(format!(
                "{} '{}' is already taken",
                kind, value
            ))),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn release_handle(&self, kind: &str, value: &str) -> Result<()> {
        self.client
            .fluent()
            .delete()
            .from(collections::USER_HANDLES)
            .document_id(handle_doc_id(kind, value))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn create_user(&self, new: NewUser) -> Result<User> {
        let id = self.allocate_id(collections::USERS).await?;

        self.reserve_handle("username", &new.username, id).await?;
        if let Err(e) = self.reserve_handle("email", &new.email, id).await {
            if let Err(release_err) = self.release_handle("username", &new.username).await {
                tracing::warn!(
                    error = %release_err,
                    username = %new.username,
                    "Failed to release username after email conflict"
                );
            }
            return Err(e);
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
        self.put(collections::USERS, id.to_string(), &user).await?;

        tracing::debug!(user_id = id, username = %user.username, "Created user");
        Ok(user)
    }

    pub async fn get_user(&self, id: u64) -> Result<Option<User>> {
        self.get_by_id(collections::USERS, id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.list_all(collections::USERS).await?;
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    // ─── Team Operations ─────────────────────────────────────────

    pub async fn create_team(&self, new: NewTeam) -> Result<Team> {
        let team = Team {
            id: self.allocate_id(collections::TEAMS).await?,
            name: new.name,
            description: new.description,
            created_at: Utc::now(),
        };
        self.put(collections::TEAMS, team.id.to_string(), &team)
            .await?;
        Ok(team)
    }

    pub async fn get_team(&self, id: u64) -> Result<Option<Team>> {
        self.get_by_id(collections::TEAMS, id).await
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        let mut teams: Vec<Team> = self.list_all(collections::TEAMS).await?;
        teams.sort_by_key(|t| t.id);
        Ok(teams)
    }

    // ─── Activity Operations ─────────────────────────────────────

    pub async fn create_activity(&self, new: NewActivity) -> Result<Activity> {
        let activity = Activity {
            id: self.allocate_id(collections::ACTIVITIES).await?,
            user_id: new.user_id,
            activity_type: new.activity_type,
            duration: new.duration,
            calories_burned: new.calories_burned,
            date: new.date,
            created_at: Utc::now(),
        };
        self.put(collections::ACTIVITIES, activity.id.to_string(), &activity)
            .await?;
        Ok(activity)
    }

    pub async fn get_activity(&self, id: u64) -> Result<Option<Activity>> {
        self.get_by_id(collections::ACTIVITIES, id).await
    }

    pub async fn list_activities(&self, user_id: Option<u64>) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> = match user_id {
            Some(user_id) => self
                .client
                .fluent()
                .select()
                .from(collections::ACTIVITIES)
                .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            None => self.list_all(collections::ACTIVITIES).await?,
        };
        activities.sort_by_key(|a| a.id);
        Ok(activities)
    }

    pub async fn delete_activity(&self, id: u64) -> Result<bool> {
        if self.get_activity(id).await?.is_none() {
            return Ok(false);
        }

        self.client
            .fluent()
            .delete()
            .from(collections::ACTIVITIES)
            .document_id(id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }

    pub async fn sum_calories_for_user(&self, user_id: u64) -> Result<u64> {
        let activities = self.list_activities(Some(user_id)).await?;
        Ok(activities
            .iter()
            .map(|a| u64::from(a.calories_burned))
            .sum())
    }

    // ─── Workout Operations ──────────────────────────────────────

    pub async fn create_workout(&self, new: NewWorkout) -> Result<Workout> {
        let workout = Workout {
            id: self.allocate_id(collections::WORKOUTS).await?,
            name: new.name,
            description: new.description,
            difficulty: new.difficulty,
            duration: new.duration,
            category: new.category,
        };
        self.put(collections::WORKOUTS, workout.id.to_string(), &workout)
            .await?;
        Ok(workout)
    }

    pub async fn get_workout(&self, id: u64) -> Result<Option<Workout>> {
        self.get_by_id(collections::WORKOUTS, id).await
    }

    pub async fn list_workouts(&self) -> Result<Vec<Workout>> {
        let mut workouts: Vec<Workout> = self.list_all(collections::WORKOUTS).await?;
        workouts.sort_by_key(|w| w.id);
        Ok(workouts)
    }

    // ─── Leaderboard Operations ──────────────────────────────────

    async fn leaderboard_pointer(&self) -> Result<Option<LeaderboardPointer>> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::LEADERBOARD_META)
            .obj()
            .one(CURRENT_LEADERBOARD)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn generation_entries(&self, generation: u64) -> Result<Vec<LeaderboardEntry>> {
        let mut entries: Vec<LeaderboardEntry> = self
            .client
            .fluent()
            .select()
            .from(collections::LEADERBOARD)
            .filter(move |q| q.for_all([q.field("generation").eq(generation)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        entries.sort_by_key(|e| e.rank);
        Ok(entries)
    }

    async fn delete_generation(&self, generation: u64) -> Result<usize> {
        let entries = self.generation_entries(generation).await?;
        self.batch_delete(&entries, collections::LEADERBOARD, entry_doc_id)
            .await?;
        Ok(entries.len())
    }

    /// Read the generation the pointer document currently names.
    pub async fn leaderboard(&self) -> Result<LeaderboardSnapshot> {
        let Some(pointer) = self.leaderboard_pointer().await? else {
            return Ok(LeaderboardSnapshot::default());
        };

        Ok(LeaderboardSnapshot {
            generation: pointer.generation,
            computed_at: Some(pointer.computed_at),
            entries: self.generation_entries(pointer.generation).await?,
        })
    }

    /// Publish a new leaderboard generation by copy-and-swap.
    ///
    /// 1. Write every entry of generation N+1 (readers ignore it for now)
    /// 2. Flip the pointer document to N+1
    /// 3. Delete generation N-1, keeping N for readers that already hold the old pointer
    ///
    /// A failure before step 2 leaves generation N current.
    pub async fn replace_leaderboard(&self, ranked: &[RankedTotal]) -> Result<LeaderboardSnapshot> {
        let pointer = self.leaderboard_pointer().await?;
        let previous = pointer.as_ref().map(|p| p.generation).unwrap_or(0);
        let last_entry_id = pointer.as_ref().map(|p| p.last_entry_id).unwrap_or(0);
        let generation = previous + 1;
        let now = Utc::now();

        // Leftovers of an earlier failed attempt at this generation
        let stale = self.delete_generation(generation).await?;
        if stale > 0 {
            tracing::warn!(generation, stale, "Removed entries of an unpublished generation");
        }

        let entries: Vec<LeaderboardEntry> = ranked
            .iter()
            .zip(last_entry_id + 1..)
            .map(|(row, id)| LeaderboardEntry {
                id,
                user_id: row.user_id,
                total_points: row.total_points,
                rank: row.rank,
                generation,
                updated_at: now,
            })
            .collect();

        for chunk in entries.chunks(BATCH_SIZE) {
            let mut transaction =
                self.client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

            for entry in chunk {
                self.client
                    .fluent()
                    .update()
                    .in_col(collections::LEADERBOARD)
                    .document_id(entry_doc_id(entry))
                    .object(entry)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add leaderboard entry to transaction: {}",
                            e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Leaderboard staging commit failed: {}", e))
            })?;
        }

        let new_pointer = LeaderboardPointer {
            generation,
            computed_at: now,
            last_entry_id: last_entry_id + entries.len() as u64,
        };
        self.put(
            collections::LEADERBOARD_META,
            CURRENT_LEADERBOARD.to_string(),
            &new_pointer,
        )
        .await?;

        tracing::info!(generation, entries = entries.len(), "Leaderboard generation published");

        if generation > 2 {
            if let Err(e) = self.delete_generation(generation - 2).await {
                tracing::warn!(
                    error = %e,
                    generation = generation - 2,
                    "Failed to delete retired leaderboard generation"
                );
            }
        }

        Ok(LeaderboardSnapshot {
            generation,
            computed_at: Some(now),
            entries,
        })
    }

    // ─── Maintenance ─────────────────────────────────────────────

    /// Delete every user, handle, team, activity and workout document.
    pub async fn clear_entities(&self) -> Result<()> {
        let activities: Vec<Activity> = self.list_all(collections::ACTIVITIES).await?;
        self.batch_delete(&activities, collections::ACTIVITIES, |a| a.id.to_string())
            .await?;

        let workouts: Vec<Workout> = self.list_all(collections::WORKOUTS).await?;
        self.batch_delete(&workouts, collections::WORKOUTS, |w| w.id.to_string())
            .await?;

        let users: Vec<User> = self.list_all(collections::USERS).await?;
        let handles: Vec<String> = users
            .iter()
            .flat_map(|u| {
                [
                    handle_doc_id("username", &u.username),
                    handle_doc_id("email", &u.email),
                ]
            })
            .collect();
        self.batch_delete(&handles, collections::USER_HANDLES, |h| h.clone())
            .await?;
        self.batch_delete(&users, collections::USERS, |u| u.id.to_string())
            .await?;

        let teams: Vec<Team> = self.list_all(collections::TEAMS).await?;
        self.batch_delete(&teams, collections::TEAMS, |t| t.id.to_string())
            .await?;

        tracing::info!(
            users = users.len(),
            teams = teams.len(),
            activities = activities.len(),
            workouts = workouts.len(),
            "Cleared Firestore collections"
        );

        Ok(())
    }
}
