// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal API tests: access enforcement, input validation, read and write.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use gym_journal::models::{AccessStatus, Region};
use serde_json::json;
use tower::ServiceExt;

mod common;

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_journal(app: Router, token: Option<&str>) -> Response {
    let mut request = Request::builder().method("GET").uri("/api/journal");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_journal(app: Router, token: &str, body: String) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/journal")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_journal_requires_session() {
    let (app, _, _) = common::create_test_app();
    let response = get_journal(app, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_denied_session_is_forbidden() {
    let (app, state, store) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        "stranger@example.com",
        AccessStatus::Denied,
    );

    let response = get_journal(app, Some(&token)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "access_denied");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("stranger@example.com"));
    // Nothing was read or written on the user's behalf
    assert_eq!(store.calls().total(), 0);
}

#[tokio::test]
async fn test_access_check_in_progress_is_forbidden() {
    let (app, state, _) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Checking,
    );

    let response = post_journal(
        app,
        &token,
        json!({"date": "2024-01-01", "note": "hi"}).to_string(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_date_is_bad_request() {
    let (app, state, store) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Granted,
    );

    let response = post_journal(
        app,
        &token,
        json!({"date": "01/02/2024", "note": "leg day"}).to_string(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
    assert_eq!(store.calls().append, 0);
}

#[tokio::test]
async fn test_overlong_exercise_name_is_bad_request() {
    let (app, state, _) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Granted,
    );

    let body = json!({
        "date": "2024-01-01",
        "exercises": [{"name": "a".repeat(101), "sets": 3, "reps": "10"}],
    });
    let response = post_journal(app, &token, body.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_finite_metrics_are_bad_request() {
    let (app, state, store) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Granted,
    );

    let body = json!({"date": "2024-01-01", "metrics": {"weight": "NaN", "bmi": "inf"}});
    let response = post_journal(app, &token, body.to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
    assert_eq!(store.append_calls(Region::Metrics), 0);
}

#[tokio::test]
async fn test_padded_date_is_bad_request() {
    let (app, state, store) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Granted,
    );

    let body = json!({"date": " 2024-01-01", "note": "leg day"});
    let response = post_journal(app, &token, body.to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.calls().append, 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, state, _) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Granted,
    );

    let response = post_journal(app, &token, "{not json".to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_then_read_dashboard() {
    let (app, state, store) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Granted,
    );

    // Form-style input: numbers as strings, blank BMI
    let body = json!({
        "date": "2024-03-02",
        "exercises": [
            {"name": "Bench", "sets": "3", "reps": "10"},
            {"name": "", "sets": "", "reps": ""}
        ],
        "metrics": {"weight": "80", "bmi": ""},
        "note": ""
    });
    let response = post_journal(app.clone(), &token, body.to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = json_body(response).await;
    assert_eq!(outcome["status"], "ok");
    assert_eq!(outcome["workouts"], json!({"status": "written", "rows": 1}));
    assert_eq!(outcome["metrics"], json!({"status": "written", "rows": 1}));
    assert_eq!(outcome["note"], json!({"status": "skipped"}));

    assert_eq!(store.append_calls(Region::Workouts), 1);
    assert_eq!(store.append_calls(Region::Metrics), 1);
    assert_eq!(store.append_calls(Region::DailyJournal), 0);

    let second = json!({"date": "2024-01-15", "metrics": {"weight": 82.5, "bmi": 24.1}});
    let response = post_journal(app.clone(), &token, second.to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_journal(app, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = json_body(response).await;

    assert_eq!(dashboard["workouts"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["workouts"][0]["exercise"], "Bench");
    assert_eq!(dashboard["workouts"][0]["sets"], 3);
    assert_eq!(dashboard["attendance"], json!(["2024-03-02"]));

    // Sorted by date even though written out of order
    let metrics = dashboard["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0]["date"], "2024-01-15");
    assert_eq!(metrics[0]["display_date"], "Jan 15");
    assert_eq!(metrics[1]["weight"], 80.0);
    // Blank BMI reads back as zero
    assert_eq!(metrics[1]["bmi"], 0.0);
}

#[tokio::test]
async fn test_read_failure_returns_empty_dashboard() {
    let (app, state, store) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Granted,
    );
    store.seed_store("GymJournalData");
    store.set_fail_batch_read(true);

    let response = get_journal(app, Some(&token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = json_body(response).await;
    assert_eq!(dashboard["workouts"], json!([]));
    assert_eq!(dashboard["metrics"], json!([]));
    assert_eq!(dashboard["notes"], json!([]));
    assert_eq!(dashboard["attendance"], json!([]));
}

#[tokio::test]
async fn test_partial_failure_is_reported() {
    let (app, state, store) = common::create_test_app();
    let token = common::sign_in(
        &state,
        common::TEST_SUBJECT,
        common::TEST_EMAIL,
        AccessStatus::Granted,
    );
    let id = store.seed_store("GymJournalData");
    store.fail_appends_for(Region::Metrics);

    let body = json!({
        "date": "2024-01-01",
        "exercises": [{"name": "Squat", "sets": 5, "reps": 5}],
        "metrics": {"weight": 90},
        "note": "felt heavy"
    });
    let response = post_journal(app, &token, body.to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let outcome = json_body(response).await;
    assert_eq!(outcome["status"], "partial");
    assert_eq!(outcome["workouts"]["status"], "written");
    assert_eq!(outcome["metrics"]["status"], "failed");
    assert_eq!(outcome["note"]["status"], "written");

    // Completed appends stay in place
    assert_eq!(store.rows(&id, Region::Workouts).len(), 2);
    assert_eq!(store.rows(&id, Region::DailyJournal).len(), 2);
    assert_eq!(store.rows(&id, Region::Metrics).len(), 1);
}
