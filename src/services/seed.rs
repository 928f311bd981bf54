// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Demo data generator.
//!
//! Wipes the entity collections and fills them with two superhero teams,
//! their members, a few weeks of random activities and a set of workouts,
//! then recomputes the leaderboard. The random source is passed in so runs
//! can be reproduced with a fixed seed.

use crate::db::Db;
use crate::error::Result;
use crate::models::{NewActivity, NewTeam, NewUser, NewWorkout};
use crate::services::leaderboard::{LeaderboardService, RecomputeSummary};
use chrono::{Duration, NaiveDate};
use rand::Rng;
use std::ops::RangeInclusive;

pub const ACTIVITIES_PER_USER: RangeInclusive<u32> = 5..=10;
pub const DURATION_MINUTES: RangeInclusive<u32> = 20..=120;
/// Calories burned per minute
pub const INTENSITY: RangeInclusive<u32> = 5..=12;
pub const MAX_DAYS_AGO: i64 = 30;

pub const ACTIVITY_TYPES: &[&str] = &[
    "Running",
    "Swimming",
    "Cycling",
    "Weightlifting",
    "Yoga",
    "Boxing",
    "HIIT",
];

struct TeamFixture {
    name: &'static str,
    description: &'static str,
    /// (username, name, email, password)
    members: &'static [(&'static str, &'static str, &'static str, &'static str)],
}

const TEAMS: &[TeamFixture] = &[
    TeamFixture {
        name: "Team Marvel",
        description: "Earth's Mightiest Heroes working together to achieve peak fitness",
        members: &[
            ("ironman", "Tony Stark", "ironman@marvel.com", "arc_reactor_3000"),
            ("captainamerica", "Steve Rogers", "captainamerica@marvel.com", "shield_bearer"),
            ("thor", "Thor Odinson", "thor@asgard.com", "mjolnir_worthy"),
            ("blackwidow", "Natasha Romanoff", "blackwidow@marvel.com", "red_ledger"),
            ("hulk", "Bruce Banner", "hulk@marvel.com", "smash_time"),
            ("spiderman", "Peter Parker", "spiderman@marvel.com", "web_slinger"),
        ],
    },
    TeamFixture {
        name: "Team DC",
        description: "The Justice League maintaining superhuman strength and endurance",
        members: &[
            ("superman", "Clark Kent", "superman@dc.com", "kryptonite_free"),
            ("batman", "Bruce Wayne", "batman@dc.com", "dark_knight"),
            ("wonderwoman", "Diana Prince", "wonderwoman@dc.com", "lasso_truth"),
            ("flash", "Barry Allen", "flash@dc.com", "speed_force"),
            ("aquaman", "Arthur Curry", "aquaman@dc.com", "trident_power"),
            ("greenlantern", "Hal Jordan", "greenlantern@dc.com", "will_power"),
        ],
    },
];

/// (name, description, difficulty, duration, category)
const WORKOUTS: &[(&str, &str, &str, u32, &str)] = &[
    (
        "Super Soldier Training",
        "Captain America's legendary workout routine for peak human performance",
        "Advanced",
        60,
        "Strength",
    ),
    (
        "Asgardian Power Lifting",
        "Thor's mighty lifting routine to build god-like strength",
        "Expert",
        90,
        "Strength",
    ),
    (
        "Speed Force Sprint",
        "Flash's high-intensity sprint training for maximum speed",
        "Advanced",
        30,
        "Cardio",
    ),
    (
        "Batcave HIIT",
        "Batman's intense interval training for vigilante readiness",
        "Advanced",
        45,
        "HIIT",
    ),
    (
        "Amazonian Warrior Yoga",
        "Wonder Woman's flexibility and balance training",
        "Intermediate",
        50,
        "Flexibility",
    ),
    (
        "Web-Swinging Cardio",
        "Spider-Man's agility and endurance workout",
        "Intermediate",
        40,
        "Cardio",
    ),
    (
        "Atlantean Swim Session",
        "Aquaman's underwater resistance training",
        "Advanced",
        60,
        "Swimming",
    ),
    (
        "Arc Reactor Core",
        "Iron Man's core strengthening routine",
        "Intermediate",
        35,
        "Core",
    ),
];

/// Counts of what a seeding run created.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub teams: usize,
    pub users: usize,
    pub activities: usize,
    pub workouts: usize,
    pub leaderboard: RecomputeSummary,
}

/// Draw one random activity for a user, dated relative to `today`.
pub fn random_activity<R: Rng + ?Sized>(rng: &mut R, user_id: u64, today: NaiveDate) -> NewActivity {
    let activity_type = ACTIVITY_TYPES[rng.gen_range(0..ACTIVITY_TYPES.len())];
    let duration = rng.gen_range(DURATION_MINUTES);
    let calories_burned = duration * rng.gen_range(INTENSITY);
    let days_ago = rng.gen_range(0..=MAX_DAYS_AGO);

    NewActivity {
        user_id,
        activity_type: activity_type.to_string(),
        duration,
        calories_burned,
        date: today - Duration::days(days_ago),
    }
}

/// Replace the store contents with demo data and rank it.
pub async fn populate<R: Rng + ?Sized>(
    db: &Db,
    leaderboard: &LeaderboardService,
    rng: &mut R,
    today: NaiveDate,
) -> Result<SeedReport> {
    tracing::info!(backend = db.backend_name(), "Clearing existing data");
    db.clear_entities().await?;

    let mut user_ids = Vec::new();
    for fixture in TEAMS {
        let team = db
            .create_team(NewTeam {
                name: fixture.name.to_string(),
                description: fixture.description.to_string(),
            })
            .await?;
        tracing::info!(team_id = team.id, name = %team.name, "Created team");

        for &(username, name, email, password) in fixture.members {
            let user = db
                .create_user(NewUser {
                    username: username.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    team_id: Some(team.id),
                })
                .await?;
            tracing::debug!(user_id = user.id, username, "Created user");
            user_ids.push(user.id);
        }
    }

    let mut activities = 0;
    for &user_id in &user_ids {
        let count = rng.gen_range(ACTIVITIES_PER_USER);
        for _ in 0..count {
            db.create_activity(random_activity(rng, user_id, today))
                .await?;
        }
        activities += count as usize;
    }
    tracing::info!(activities, "Created activities");

    for &(name, description, difficulty, duration, category) in WORKOUTS {
        db.create_workout(NewWorkout {
            name: name.to_string(),
            description: description.to_string(),
            difficulty: difficulty.to_string(),
            duration,
            category: category.to_string(),
        })
        .await?;
    }
    tracing::info!(workouts = WORKOUTS.len(), "Created workouts");

    let summary = leaderboard.recompute().await?;

    Ok(SeedReport {
        teams: TEAMS.len(),
        users: user_ids.len(),
        activities,
        workouts: WORKOUTS.len(),
        leaderboard: summary,
    })
}
