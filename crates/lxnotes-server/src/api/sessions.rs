// ABOUTME: Session lifecycle API handlers: open, close, and switch production.
// ABOUTME: Switching production drops the session's undo history.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use lxnotes_core::{HistoryStatus, ProductionId};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, lookup_session, parse_id};
use crate::app_state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub production_id: Option<ProductionId>,
}

#[derive(Debug, Serialize)]
pub struct OpenSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchProductionRequest {
    pub production_id: ProductionId,
}

/// POST /api/sessions - Open a new editing session.
pub async fn open_session(
    State(state): State<SharedState>,
    Json(req): Json<OpenSessionRequest>,
) -> impl IntoResponse {
    let session_id = state.open_session(req.actor_id, req.production_id).await;
    (
        StatusCode::CREATED,
        Json(OpenSessionResponse {
            session_id: session_id.to_string(),
        }),
    )
}

/// DELETE /api/sessions/{sid} - Close a session and discard its history.
pub async fn close_session(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_id(&sid, "session")?;
    if state.close_session(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("session not found"))
    }
}

/// PUT /api/sessions/{sid}/production - Select the production being edited.
pub async fn switch_production(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
    Json(req): Json<SwitchProductionRequest>,
) -> Result<Json<HistoryStatus>, ApiError> {
    let handle = lookup_session(&state, &sid).await?;
    let mut session = handle.lock().await;
    session.switch_production(req.production_id);
    Ok(Json(session.history_status()))
}
