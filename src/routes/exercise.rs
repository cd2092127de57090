use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::qlearn::{ExerciseType, LevelSpec, SelectorError};
use crate::response::AppError;
use crate::services::exercise::{self, NextExerciseInput, SubmitAnswerInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/select_next", post(select_next))
        .route("/record_outcome", post(record_outcome))
        .route("/difficulty_levels", get(difficulty_levels))
        .route("/qtable/flush", post(flush_table))
}

#[derive(Debug, Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectNextRequest {
    #[serde(alias = "user_id")]
    learner_id: String,
    #[serde(default, alias = "last_correct")]
    last_correct: bool,
    #[serde(default = "default_difficulty", alias = "current_difficulty")]
    current_difficulty: i64,
    #[serde(default, alias = "force_exercise_type")]
    force_exercise_type: Option<String>,
    #[serde(default)]
    questions_completed: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectNextResponse {
    difficulty: u8,
    exercise_type: ExerciseType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordOutcomeRequest {
    #[serde(alias = "user_id")]
    learner_id: String,
    difficulty: i64,
    #[serde(alias = "exercise_type")]
    exercise_type: String,
    #[serde(alias = "is_correct")]
    is_correct: bool,
    #[serde(default)]
    streak: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordOutcomeResponse {
    new_difficulty: u8,
    reward: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlushResponse {
    written: bool,
    entries: usize,
}

fn default_difficulty() -> i64 {
    1
}

async fn select_next(
    State(state): State<AppState>,
    payload: Result<Json<SelectNextRequest>, JsonRejection>,
) -> Result<Json<SelectNextResponse>, AppError> {
    let Json(req) = payload?;

    let input = NextExerciseInput {
        learner_id: req.learner_id,
        last_correct: req.last_correct,
        current_difficulty: req.current_difficulty,
        force_exercise_type: req
            .force_exercise_type
            .filter(|t| !t.trim().is_empty())
            .map(|t| ExerciseType::parse(t.trim())),
        questions_completed: req.questions_completed.unwrap_or(0),
    };

    let selector = state.selector();
    let next = run_blocking(move || exercise::next_exercise(&selector, &input)).await?;

    Ok(Json(SelectNextResponse {
        difficulty: next.difficulty,
        exercise_type: next.exercise_type,
    }))
}

async fn record_outcome(
    State(state): State<AppState>,
    payload: Result<Json<RecordOutcomeRequest>, JsonRejection>,
) -> Result<Json<RecordOutcomeResponse>, AppError> {
    let Json(req) = payload?;

    let input = SubmitAnswerInput {
        learner_id: req.learner_id,
        difficulty: req.difficulty,
        exercise_type: ExerciseType::parse(req.exercise_type.trim()),
        is_correct: req.is_correct,
        streak: req.streak.unwrap_or(0),
    };

    let selector = state.selector();
    let outcome = run_blocking(move || exercise::submit_answer(&selector, &input)).await?;

    Ok(Json(RecordOutcomeResponse {
        new_difficulty: outcome.new_difficulty,
        reward: outcome.reward,
    }))
}

async fn difficulty_levels(State(state): State<AppState>) -> Json<SuccessResponse<Vec<LevelSpec>>> {
    Json(SuccessResponse {
        success: true,
        data: state.selector().catalog().levels().to_vec(),
    })
}

async fn flush_table(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<FlushResponse>>, AppError> {
    let selector = state.selector();
    let written = {
        let selector = selector.clone();
        run_blocking(move || selector.flush()).await?
    };

    Ok(Json(SuccessResponse {
        success: true,
        data: FlushResponse {
            written,
            entries: selector.entry_count(),
        },
    }))
}

/// Table access takes a blocking lock and may write to disk.
async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, SelectorError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| AppError::internal(format!("selector task failed: {err}")))?
        .map_err(AppError::from)
}
