// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard recompute and read tests over the in-memory store.

use axum::http::StatusCode;
use octofit_tracker::models::RankedTotal;
use serde_json::{json, Value};
use std::sync::Arc;

mod common;
use common::{create_user, get, log_activity, post, send};

async fn recompute(app: &axum::Router) -> Value {
    let (status, body) = post(app, "/api/leaderboard/recompute/", json!({})).await;
    assert_eq!(status, StatusCode::OK, "recompute failed: {}", body);
    body
}

async fn board(app: &axum::Router) -> Vec<Value> {
    let (status, body) = get(app, "/api/leaderboard/").await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().unwrap().clone()
}

fn ranking(rows: &[Value]) -> Vec<(u64, u64, u64)> {
    rows.iter()
        .map(|r| {
            (
                r["user_id"].as_u64().unwrap(),
                r["total_points"].as_u64().unwrap(),
                r["rank"].as_u64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_empty_before_first_recompute() {
    let (app, _state) = common::create_test_app();
    create_user(&app, "early", None).await;

    assert!(board(&app).await.is_empty());
}

#[tokio::test]
async fn test_ties_ranked_by_insertion_order() {
    let (app, _state) = common::create_test_app();
    let a = create_user(&app, "a", None).await;
    let b = create_user(&app, "b", None).await;
    let c = create_user(&app, "c", None).await;

    log_activity(&app, a, 100).await;
    log_activity(&app, b, 200).await;
    log_activity(&app, b, 50).await;
    log_activity(&app, c, 250).await;

    let summary = recompute(&app).await;
    assert_eq!(summary["generation"], 1);
    assert_eq!(summary["users_ranked"], 3);
    assert_eq!(summary["activities_counted"], 4);

    let rows = board(&app).await;
    assert_eq!(ranking(&rows), vec![(b, 250, 1), (c, 250, 2), (a, 100, 3)]);
}

#[tokio::test]
async fn test_user_without_activities_ranked_last_with_zero() {
    let (app, _state) = common::create_test_app();
    let idle = create_user(&app, "idle", None).await;
    let busy = create_user(&app, "busy", None).await;
    log_activity(&app, busy, 300).await;

    recompute(&app).await;

    let rows = board(&app).await;
    assert_eq!(ranking(&rows), vec![(busy, 300, 1), (idle, 0, 2)]);
    assert_eq!(rows[1]["total_calories"], 0);
}

#[tokio::test]
async fn test_rows_carry_user_and_team() {
    let (app, _state) = common::create_test_app();
    let (_, team) = post(&app, "/api/teams/", json!({"name": "Team DC"})).await;
    let team_id = team["id"].as_u64().unwrap();
    let flash = create_user(&app, "flash", Some(team_id)).await;
    log_activity(&app, flash, 400).await;

    recompute(&app).await;

    let rows = board(&app).await;
    assert_eq!(rows[0]["user"]["username"], "flash");
    assert_eq!(rows[0]["user"]["id"], flash);
    assert_eq!(rows[0]["team"]["name"], "Team DC");

    let entry_id = rows[0]["id"].as_u64().unwrap();
    let (status, entry) = get(&app, &format!("/api/leaderboard/{}/", entry_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["rank"], 1);
    assert_eq!(entry["total_points"], 400);
}

#[tokio::test]
async fn test_missing_user_and_team_render_as_null() {
    let (app, state) = common::create_test_app();
    let drifter = create_user(&app, "drifter", Some(999)).await;
    log_activity(&app, drifter, 10).await;

    recompute(&app).await;
    let rows = board(&app).await;
    assert!(rows[0]["user"].is_object());
    assert!(rows[0]["team"].is_null());

    // Remove the users out from under the current generation
    state.db.clear_entities().await.unwrap();

    let rows = board(&app).await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["user"].is_null());
    assert!(rows[0]["team"].is_null());
    assert_eq!(rows[0]["total_points"], 10);
    assert_eq!(rows[0]["total_calories"], 0);
}

#[tokio::test]
async fn test_total_calories_is_live_and_points_are_frozen() {
    let (app, _state) = common::create_test_app();
    let user = create_user(&app, "runner", None).await;
    log_activity(&app, user, 100).await;
    recompute(&app).await;

    log_activity(&app, user, 50).await;

    let rows = board(&app).await;
    assert_eq!(rows[0]["total_points"], 100);
    assert_eq!(rows[0]["total_calories"], 150);

    recompute(&app).await;
    let rows = board(&app).await;
    assert_eq!(rows[0]["total_points"], 150);
    assert_eq!(rows[0]["total_calories"], 150);
}

#[tokio::test]
async fn test_deleted_activities_drop_out_on_recompute() {
    let (app, _state) = common::create_test_app();
    let a = create_user(&app, "a", None).await;
    let b = create_user(&app, "b", None).await;
    let first = log_activity(&app, a, 500).await;
    let second = log_activity(&app, a, 20).await;
    log_activity(&app, b, 100).await;

    recompute(&app).await;
    assert_eq!(ranking(&board(&app).await)[0], (a, 520, 1));

    for id in [first, second] {
        let (status, _) = send(&app, "DELETE", &format!("/api/activities/{}/", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    recompute(&app).await;

    assert_eq!(ranking(&board(&app).await), vec![(b, 100, 1), (a, 0, 2)]);
}

#[tokio::test]
async fn test_recompute_is_idempotent_except_for_ids() {
    let (app, _state) = common::create_test_app();
    for (name, calories) in [("x", 30), ("y", 90), ("z", 60)] {
        let id = create_user(&app, name, None).await;
        log_activity(&app, id, calories).await;
    }

    let first_summary = recompute(&app).await;
    let first = board(&app).await;
    let second_summary = recompute(&app).await;
    let second = board(&app).await;

    assert_eq!(ranking(&first), ranking(&second));
    assert_eq!(first_summary["generation"], 1);
    assert_eq!(second_summary["generation"], 2);

    // Old entry IDs are gone once the new generation is current
    let (status, _) = get(&app, &format!("/api/leaderboard/{}/", first[0]["id"])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_orphaned_activities_are_skipped() {
    let (app, _state) = common::create_test_app();
    let real = create_user(&app, "real", None).await;
    log_activity(&app, real, 10).await;
    log_activity(&app, 4242, 10_000).await;

    let summary = recompute(&app).await;
    assert_eq!(summary["orphaned_activities"], 1);
    assert_eq!(summary["activities_counted"], 2);

    assert_eq!(ranking(&board(&app).await), vec![(real, 10, 1)]);
}

#[tokio::test]
async fn test_rejected_ranking_keeps_previous_generation() {
    let (app, state) = common::create_test_app();
    let user = create_user(&app, "steady", None).await;
    log_activity(&app, user, 75).await;
    recompute(&app).await;

    let bad = [
        RankedTotal {
            user_id: user,
            total_points: 75,
            rank: 1,
        },
        RankedTotal {
            user_id: user,
            total_points: 75,
            rank: 2,
        },
    ];
    assert!(state.db.replace_leaderboard(&bad).await.is_err());

    let snapshot = state.db.leaderboard().await.unwrap();
    assert_eq!(snapshot.generation, 1);
    assert_eq!(ranking(&board(&app).await), vec![(user, 75, 1)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_partial_leaderboard() {
    let (app, state) = common::create_test_app();
    for i in 0..5u32 {
        let id = create_user(&app, &format!("user{}", i), None).await;
        log_activity(&app, id, 10 * (i + 1)).await;
    }
    recompute(&app).await;

    let writer = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            for _ in 0..50 {
                state.leaderboard.recompute().await.unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                for _ in 0..200 {
                    let rows = state.leaderboard.entries().await.unwrap();
                    assert_eq!(rows.len(), 5);
                    let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
                    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_recomputes_are_serialized() {
    let (app, state) = common::create_test_app();
    let id = create_user(&app, "solo", None).await;
    log_activity(&app, id, 5).await;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.leaderboard.recompute().await.unwrap() })
        })
        .collect();

    let mut generations = Vec::new();
    for task in tasks {
        generations.push(task.await.unwrap().generation);
    }
    generations.sort_unstable();

    assert_eq!(generations, (1..=10).collect::<Vec<u64>>());
    assert_eq!(state.db.leaderboard().await.unwrap().entries.len(), 1);
}
