// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout suggestion routes.

use crate::error::{AppError, Result};
use crate::models::{NewWorkout, Workout};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/workouts/", get(list_workouts).post(create_workout))
        .route("/api/workouts/{id}/", get(get_workout))
}

async fn list_workouts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Workout>>> {
    Ok(Json(state.db.list_workouts().await?))
}

async fn get_workout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Workout>> {
    state
        .db
        .get_workout(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))
}

async fn create_workout(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<NewWorkout>, JsonRejection>,
) -> Result<(StatusCode, Json<Workout>)> {
    let Json(payload) = payload?;
    payload.validate()?;

    let workout = state.db.create_workout(payload).await?;
    tracing::info!(workout_id = workout.id, name = %workout.name, "Workout created");

    Ok((StatusCode::CREATED, Json(workout)))
}
