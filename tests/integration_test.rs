use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use lingua_backend_rust::qlearn::{ExerciseType, StateKey};

mod common;

#[tokio::test]
async fn test_health_root() {
    let (app, _, _) = common::create_memory_app();

    let response = app.oneshot(common::get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_health_live() {
    let (app, _, _) = common::create_memory_app();

    let response = app.oneshot(common::get("/health/live")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_info_reports_table() {
    let (app, selector, _) = common::create_memory_app();
    selector
        .record_outcome("u1", 2, &ExerciseType::Listening, 1.0)
        .unwrap();

    let response = app.oneshot(common::get("/health/info")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["table"]["entries"], 1);
    assert_eq!(body["table"]["levels"], 5);
    assert_eq!(body["table"]["store"], "memory");
}

#[tokio::test]
async fn test_404_not_found() {
    let (app, _, _) = common::create_memory_app();

    let response = app.oneshot(common::get("/nonexistent/path")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::json_body(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "endpoint not found");
}

#[tokio::test]
async fn test_difficulty_levels() {
    let (app, _, _) = common::create_memory_app();

    let response = app
        .oneshot(common::get("/api/difficulty_levels"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    let levels = body["data"].as_array().unwrap();
    assert_eq!(levels.len(), 5);
    assert_eq!(levels[2]["level"], 3);
    assert_eq!(
        levels[2]["exerciseTypes"],
        json!(["speaking_sentence", "listening", "writing"])
    );
}

#[tokio::test]
async fn test_select_next_empty_table_explores_next_level() {
    let (app, _, _) = common::create_memory_app();

    let response = app
        .oneshot(common::post_json(
            "/api/select_next",
            json!({ "learnerId": "u1", "lastCorrect": true, "currentDifficulty": 2 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["difficulty"], 3);
    let exercise_type = body["exerciseType"].as_str().unwrap();
    assert!(["speaking_sentence", "listening", "writing"].contains(&exercise_type));
}

#[tokio::test]
async fn test_select_next_forced_type() {
    let (app, _, _) = common::create_memory_app();

    let response = app
        .oneshot(common::post_json(
            "/api/select_next",
            json!({
                "learnerId": "u1",
                "lastCorrect": false,
                "currentDifficulty": 3,
                "forceExerciseType": "listening"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body, json!({ "difficulty": 2, "exerciseType": "listening" }));
}

#[tokio::test]
async fn test_select_next_accepts_snake_case_fields() {
    let (app, _, _) = common::create_memory_app();

    let response = app
        .oneshot(common::post_json(
            "/api/select_next",
            json!({
                "user_id": "u1",
                "last_correct": true,
                "current_difficulty": 9,
                "force_exercise_type": "writing"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body, json!({ "difficulty": 5, "exerciseType": "writing" }));
}

#[tokio::test]
async fn test_select_next_exploits_recorded_outcomes() {
    let (app, selector, _) = common::create_memory_app();
    selector
        .record_outcome("u1", 4, &ExerciseType::Listening, 1.0)
        .unwrap();
    selector
        .record_outcome("u1", 4, &ExerciseType::SpeakingSentence, 5.0)
        .unwrap();

    let response = app
        .oneshot(common::post_json(
            "/api/select_next",
            json!({ "learnerId": "u1", "lastCorrect": true, "currentDifficulty": 3 }),
        ))
        .await
        .unwrap();

    let body = common::json_body(response).await;
    assert_eq!(body, json!({ "difficulty": 4, "exerciseType": "speaking_sentence" }));
}

#[tokio::test]
async fn test_select_next_missing_learner_is_validation_error() {
    let (app, _, _) = common::create_memory_app();

    let response = app
        .oneshot(common::post_json(
            "/api/select_next",
            json!({ "lastCorrect": true, "currentDifficulty": 2 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_record_outcome_writing_streak() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = common::create_file_app(&dir);

    let response = app
        .oneshot(common::post_json(
            "/api/record_outcome",
            json!({
                "learnerId": "u1",
                "difficulty": 3,
                "exerciseType": "writing",
                "isCorrect": true,
                "streak": 3
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["newDifficulty"], 5);
    assert!((body["reward"].as_f64().unwrap() - 4.1).abs() < 1e-9);

    let raw = std::fs::read_to_string(dir.path().join("qtable.json")).unwrap();
    let table: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let values = table["u1-3-writing"].as_array().unwrap();
    assert_eq!(values.len(), 5);
    assert!((values[2].as_f64().unwrap() - 0.41).abs() < 1e-9);
}

#[tokio::test]
async fn test_record_outcome_incorrect_sentence() {
    let (app, selector, store) = common::create_memory_app();

    let response = app
        .oneshot(common::post_json(
            "/api/record_outcome",
            json!({
                "user_id": "u1",
                "difficulty": 4,
                "exercise_type": "speaking_sentence",
                "is_correct": false
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["newDifficulty"], 3);
    assert!((body["reward"].as_f64().unwrap() - 0.5).abs() < 1e-9);

    assert_eq!(store.save_count(), 1);
    let values = selector
        .values(&StateKey::new("u1", 4, ExerciseType::SpeakingSentence))
        .unwrap();
    assert!((values[3] - 0.05).abs() < 1e-9);
}

#[tokio::test]
async fn test_record_outcome_unknown_difficulty() {
    let (app, selector, store) = common::create_memory_app();

    let response = app
        .oneshot(common::post_json(
            "/api/record_outcome",
            json!({
                "learnerId": "u1",
                "difficulty": 7,
                "exerciseType": "writing",
                "isCorrect": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(selector.entry_count(), 0);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_record_outcome_empty_learner() {
    let (app, selector, _) = common::create_memory_app();

    let response = app
        .oneshot(common::post_json(
            "/api/record_outcome",
            json!({
                "learnerId": "",
                "difficulty": 2,
                "exerciseType": "writing",
                "isCorrect": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(selector.entry_count(), 0);
}

#[tokio::test]
async fn test_persistence_failure_then_flush() {
    let (app, selector, store) = common::create_memory_app();
    store.set_fail_writes(true);

    let response = app
        .clone()
        .oneshot(common::post_json(
            "/api/record_outcome",
            json!({
                "learnerId": "u1",
                "difficulty": 1,
                "exerciseType": "listening",
                "isCorrect": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = common::json_body(response).await;
    assert_eq!(body["code"], "PERSISTENCE_UNAVAILABLE");
    assert_eq!(body["retryable"], true);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("applied"));
    assert!(message.contains("POST /api/qtable/flush"));
    assert_eq!(selector.entry_count(), 1);

    let health = app.clone().oneshot(common::get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);

    store.set_fail_writes(false);
    let response = app
        .clone()
        .oneshot(common::post_json("/api/qtable/flush", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["data"]["written"], true);
    assert_eq!(body["data"]["entries"], 1);

    let doc = store.snapshot().unwrap();
    // reward 2 + 0.5, first update
    assert!((doc["u1-1-listening"][0] - 0.25).abs() < 1e-9);

    let health = app.oneshot(common::get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
