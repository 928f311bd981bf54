// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard routes.

use crate::error::{AppError, Result};
use crate::models::LeaderboardResponse;
use crate::services::RecomputeSummary;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leaderboard/", get(list_leaderboard))
        .route("/api/leaderboard/recompute/", post(recompute))
        .route("/api/leaderboard/{id}/", get(get_leaderboard_entry))
}

/// Current leaderboard, ordered by rank.
async fn list_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardResponse>>> {
    Ok(Json(state.leaderboard.entries().await?))
}

async fn get_leaderboard_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<LeaderboardResponse>> {
    state
        .leaderboard
        .entry(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Leaderboard entry {} not found", id)))
}

/// Rebuild the leaderboard from the stored activities.
async fn recompute(State(state): State<Arc<AppState>>) -> Result<Json<RecomputeSummary>> {
    tracing::info!("Leaderboard recompute requested");
    Ok(Json(state.leaderboard.recompute().await?))
}
