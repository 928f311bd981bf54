// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OctoFit Tracker API Server
//!
//! Serves users, teams, activities, workouts and the calorie leaderboard.

use octofit_tracker::{
    config::{Config, StorageBackend},
    db::{Db, FirestoreDb},
    services::seed,
    AppState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        storage = ?config.storage,
        "Starting OctoFit Tracker API"
    );

    let db = match config.storage {
        StorageBackend::Memory => Db::memory(),
        StorageBackend::Firestore => {
            let project_id = config
                .gcp_project_id
                .as_deref()
                .ok_or("GCP_PROJECT_ID is required for the firestore backend")?;
            Db::firestore(FirestoreDb::new(project_id).await?)
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db));

    if config.seed_demo_data {
        let mut rng = StdRng::from_entropy();
        let today = chrono::Utc::now().date_naive();
        let report = seed::populate(&state.db, &state.leaderboard, &mut rng, today).await?;
        tracing::info!(
            users = report.users,
            activities = report.activities,
            generation = report.leaderboard.generation,
            "Demo data loaded"
        );
    }

    // Build router
    let app = octofit_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, base_url = %config.base_url(), "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("octofit_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
