// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! OctoFit Tracker: fitness data API
//!
//! This crate provides the backend API for users, teams, logged activities,
//! suggested workouts and a calorie-based leaderboard.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;
use services::LeaderboardService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub leaderboard: LeaderboardService,
}

impl AppState {
    pub fn new(config: Config, db: Db) -> Self {
        Self {
            config,
            leaderboard: LeaderboardService::new(db.clone()),
            db,
        }
    }
}
