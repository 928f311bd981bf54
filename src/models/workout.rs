// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Suggested workout model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// A workout suggestion. Difficulty and category are free-form labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct Workout {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub description: String,
    /// e.g. "Intermediate", "Advanced"
    pub difficulty: String,
    /// Duration in minutes
    pub duration: u32,
    pub category: String,
}

/// Payload for creating a workout.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWorkout {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 20))]
    pub difficulty: String,
    #[validate(range(min = 1))]
    pub duration: u32,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
}
