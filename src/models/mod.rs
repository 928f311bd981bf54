// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod leaderboard;
pub mod team;
pub mod user;
pub mod workout;

pub use activity::{Activity, NewActivity};
pub use leaderboard::{LeaderboardEntry, LeaderboardResponse, LeaderboardSnapshot, RankedTotal};
pub use team::{NewTeam, Team};
pub use user::{NewUser, User, UserResponse};
pub use workout::{NewWorkout, Workout};
