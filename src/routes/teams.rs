// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Team routes.

use crate::error::{AppError, Result};
use crate::models::{NewTeam, Team};
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
        .route("/api/teams/", get(list_teams).post(create_team))
        .route("/api/teams/{id}/", get(get_team))
}

async fn list_teams(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Team>>> {
    Ok(Json(state.db.list_teams().await?))
}

async fn get_team(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Result<Json<Team>> {
    state
        .db
        .get_team(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Team {} not found", id)))
}

async fn create_team(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<NewTeam>, JsonRejection>,
) -> Result<(StatusCode, Json<Team>)> {
    let Json(payload) = payload?;
    payload.validate()?;

    let team = state.db.create_team(payload).await?;
    tracing::info!(team_id = team.id, name = %team.name, "Team created");

    Ok((StatusCode::CREATED, Json(team)))
}
