//! Error types for the PDF checker server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use model_judge::JudgeError;
use rule_engine::AnalysisError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Message returned when the failure should not be shown to clients
const GENERIC_FAILURE: &str = "Failed to analyze PDF";

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl ServerError {
    pub fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(limit)
        } else {
            ServerError::InvalidRequest(err.body_text())
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ServerError::PayloadTooLarge(_) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                self.to_string(),
            ),
            ServerError::Analysis(err) => analysis_error_parts(err),
        };

        let body = ErrorResponse {
            success: false,
            message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

fn analysis_error_parts(err: &AnalysisError) -> (StatusCode, &'static str, String) {
    match err {
        AnalysisError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        AnalysisError::PageCount { .. } => {
            (StatusCode::BAD_REQUEST, "PAGE_COUNT_ERROR", err.to_string())
        }
        AnalysisError::Extraction(_) => (StatusCode::BAD_REQUEST, "INVALID_PDF", err.to_string()),
        // Message only; the raw reply was already logged by the judge
        AnalysisError::Judge(JudgeError::Protocol { .. }) => {
            (StatusCode::BAD_GATEWAY, "LLM_PROTOCOL_ERROR", err.to_string())
        }
        AnalysisError::Judge(judge_err) => {
            error!("Model backend failure: {}", judge_err);
            (
                StatusCode::BAD_GATEWAY,
                "MODEL_UNAVAILABLE",
                GENERIC_FAILURE.to_string(),
            )
        }
        AnalysisError::Internal(msg) => {
            error!("Analysis failed: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                GENERIC_FAILURE.to_string(),
            )
        }
    }
}
