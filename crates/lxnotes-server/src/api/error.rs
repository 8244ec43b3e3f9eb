// ABOUTME: JSON error responses for the lxnotes API and their mapping from session errors.
// ABOUTME: Every failure renders as {"error": "..."} with a status code chosen by cause.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lxnotes_core::{SessionError, StoreError};
use ulid::Ulid;

use crate::app_state::{SessionHandle, SharedState};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match &e {
            SessionError::NoProduction | SessionError::Command(_) => StatusCode::BAD_REQUEST,
            // Notes from another production are not visible to this session.
            SessionError::WrongProduction { .. } => StatusCode::NOT_FOUND,
            SessionError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            SessionError::Store(StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            SessionError::Store(StoreError::Backend(_)) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

pub fn parse_id(raw: &str, what: &str) -> Result<Ulid, ApiError> {
    raw.parse::<Ulid>()
        .map_err(|_| ApiError::bad_request(format!("invalid {} id", what)))
}

/// Resolve a session id from the path to its live handle.
pub async fn lookup_session(state: &SharedState, raw_id: &str) -> Result<SessionHandle, ApiError> {
    let session_id = parse_id(raw_id, "session")?;
    state
        .session(&session_id)
        .await
        .ok_or_else(|| ApiError::not_found("session not found"))
}
