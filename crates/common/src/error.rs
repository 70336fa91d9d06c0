use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, FixedOffset};
use serde_json::{Value, json};
use thiserror::Error;

/// Why an inbound event was not accepted.
///
/// Variants are listed in the order the validator checks them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid type for field '{field}': expected a string, got {value}")]
    InvalidType { field: &'static str, value: Value },

    #[error("Unable to parse '{field}' value '{raw}' as a timestamp")]
    UnparsableTimestamp { field: &'static str, raw: String },

    #[error(
        "end_time '{}' precedes start_time '{}'",
        .end.to_rfc3339(),
        .start.to_rfc3339()
    )]
    InvertedTimeRange {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },

    #[error("Unknown event_type '{0}'")]
    UnknownEventType(String),

    #[error("Unknown program_id '{0}'")]
    UnknownProgram(String),
}

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Rejected(#[from] RejectionReason),

    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Rejected(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({ "error_message": self.to_string() });
        (status, Json(body)).into_response()
    }
}
