use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::qlearn::SelectorError;

/// The outcome is already applied in memory; resubmitting it would apply it twice.
const PERSISTENCE_RETRY_MESSAGE: &str =
    "outcome applied but not yet saved; retry with POST /api/qtable/flush, do not resubmit";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    is_operational: bool,
    retryable: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn persistence_unavailable(message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            ..Self::operational(StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_UNAVAILABLE", message)
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
            retryable: false,
        }
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
            retryable: false,
        }
    }
}

impl From<SelectorError> for AppError {
    fn from(err: SelectorError) -> Self {
        match err {
            SelectorError::EmptyLearnerId
            | SelectorError::UnknownDifficulty(_)
            | SelectorError::InvalidExerciseType(_)
            | SelectorError::InvalidReward => Self::validation(err.to_string()),
            SelectorError::Persistence(_) => {
                Self::persistence_unavailable(PERSISTENCE_RETRY_MESSAGE)
            }
            SelectorError::NoExerciseTypes(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if !self.is_operational {
            tracing::error!(code = %self.code, error = %self.message, "request failed");
        }

        let message = if self.is_operational {
            self.message
        } else {
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
            retryable: self.retryable,
        };

        (self.status, Json(body)).into_response()
    }
}
