// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Populate the store with demo data and rank it.
//!
//! Usage:
//! ```bash
//! # Fresh random data
//! STORAGE_BACKEND=firestore GCP_PROJECT_ID=octofit cargo run --bin populate-db
//!
//! # Reproducible data
//! cargo run --bin populate-db -- --seed 42
//!
//! # Only rebuild the leaderboard from existing activities
//! cargo run --bin populate-db -- --recompute-only
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use octofit_tracker::{
    config::{Config, StorageBackend},
    db::{Db, FirestoreDb},
    services::{seed, LeaderboardService},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "populate-db",
    about = "Populate the OctoFit database with test data"
)]
struct Args {
    /// Seed for the random activity generator
    #[arg(long)]
    seed: Option<u64>,

    /// Skip seeding and only recompute the leaderboard
    #[arg(long)]
    recompute_only: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let db = match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is discarded on exit");
            Db::memory()
        }
        StorageBackend::Firestore => {
            let project_id = config
                .gcp_project_id
                .as_deref()
                .context("GCP_PROJECT_ID is required for the firestore backend")?;
            Db::firestore(FirestoreDb::new(project_id).await?)
        }
    };
    let leaderboard = LeaderboardService::new(db.clone());

    if args.recompute_only {
        let summary = leaderboard.recompute().await?;
        println!(
            "Leaderboard generation {}: {} users ranked from {} activities",
            summary.generation, summary.users_ranked, summary.activities_counted
        );
        return print_ranking(&leaderboard).await;
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let today = chrono::Utc::now().date_naive();

    let report = seed::populate(&db, &leaderboard, &mut rng, today).await?;

    print_ranking(&leaderboard).await?;

    println!();
    println!("=== Database Population Complete ===");
    println!("Teams: {}", report.teams);
    println!("Users: {}", report.users);
    println!("Activities: {}", report.activities);
    println!("Leaderboard Entries: {}", report.leaderboard.users_ranked);
    println!("Workouts: {}", report.workouts);

    Ok(())
}

async fn print_ranking(leaderboard: &LeaderboardService) -> Result<()> {
    for row in leaderboard.entries().await? {
        let name = row
            .user
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or("<unknown user>");
        println!("  Rank {}: {} - {} points", row.rank, name, row.total_points);
    }
    Ok(())
}
