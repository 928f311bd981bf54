// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API root: lists the resource URLs.

use crate::config::Config;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Resource collections advertised by the root endpoint.
const RESOURCES: &[&str] = &["users", "teams", "activities", "leaderboard", "workouts"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api_root))
        .route("/api/", get(api_root))
}

#[derive(Debug, Serialize)]
pub struct ApiRootResponse {
    pub message: String,
    pub endpoints: BTreeMap<String, String>,
}

/// Build the discovery document for the configured public base URL.
pub fn api_root_document(config: &Config) -> ApiRootResponse {
    let base_url = config.base_url();

    let mut endpoints: BTreeMap<String, String> = RESOURCES
        .iter()
        .map(|name| (name.to_string(), format!("{}/api/{}/", base_url, name)))
        .collect();
    endpoints.insert("admin".to_string(), format!("{}/admin/", base_url));

    ApiRootResponse {
        message: "Welcome to OctoFit Tracker API".to_string(),
        endpoints,
    }
}

async fn api_root(State(state): State<Arc<AppState>>) -> Json<ApiRootResponse> {
    Json(api_root_document(&state.config))
}
