// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity routes.
//!
//! Activities are never updated. They can be deleted, which takes effect on
//! the leaderboard at the next recompute.

use crate::error::{AppError, Result};
use crate::models::{Activity, NewActivity};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities/", get(list_activities).post(create_activity))
        .route(
            "/api/activities/{id}/",
            get(get_activity).delete(delete_activity),
        )
}

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// Only activities logged by this user
    user_id: Option<u64>,
}

async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<Vec<Activity>>> {
    Ok(Json(state.db.list_activities(params.user_id).await?))
}

async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Activity>> {
    state
        .db
        .get_activity(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))
}

/// Log an activity. The user ID is not required to exist.
async fn create_activity(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<NewActivity>, JsonRejection>,
) -> Result<(StatusCode, Json<Activity>)> {
    let Json(payload) = payload?;
    payload.validate()?;

    if state.db.get_user(payload.user_id).await?.is_none() {
        tracing::debug!(
            user_id = payload.user_id,
            "Activity logged for unknown user"
        );
    }

    let activity = state.db.create_activity(payload).await?;
    tracing::info!(
        activity_id = activity.id,
        user_id = activity.user_id,
        calories = activity.calories_burned,
        "Activity created"
    );

    Ok((StatusCode::CREATED, Json(activity)))
}

async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    if !state.db.delete_activity(id).await? {
        return Err(AppError::NotFound(format!("Activity {} not found", id)));
    }

    tracing::info!(activity_id = id, "Activity deleted");
    Ok(StatusCode::NO_CONTENT)
}
