// ABOUTME: Undo/redo history API handlers for a session.
// ABOUTME: Exposes status, undo, redo, clear, and keyboard shortcut dispatch.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use lxnotes_core::shortcut::{FocusTarget, KeyChord};
use lxnotes_core::{HistoryAction, HistoryStatus, UndoCommand, resolve_shortcut};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, lookup_session};
use crate::app_state::SharedState;

/// Response body after walking the history one step.
#[derive(Debug, Serialize)]
pub struct HistoryStepResponse {
    pub action: Option<HistoryAction>,
    pub command: Option<UndoCommand>,
    pub status: HistoryStatus,
}

/// A key press reported by the client, with where it happened.
#[derive(Debug, Deserialize)]
pub struct ShortcutRequest {
    pub chord: KeyChord,
    #[serde(default)]
    pub focus: FocusTarget,
    pub route: String,
}

/// GET /api/sessions/{sid}/history - Current undo/redo availability.
pub async fn get_history(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
) -> Result<Json<HistoryStatus>, ApiError> {
    let handle = lookup_session(&state, &sid).await?;
    let session = handle.lock().await;
    Ok(Json(session.history_status()))
}

async fn step(
    state: &SharedState,
    sid: &str,
    action: HistoryAction,
) -> Result<Json<HistoryStepResponse>, ApiError> {
    let handle = lookup_session(state, sid).await?;
    let mut session = handle.lock().await;
    match session.run(action).await? {
        Some(command) => Ok(Json(HistoryStepResponse {
            action: Some(action),
            command: Some(command),
            status: session.history_status(),
        })),
        None => {
            let what = match action {
                HistoryAction::Undo => "nothing to undo",
                HistoryAction::Redo => "nothing to redo",
            };
            Err(ApiError::new(StatusCode::CONFLICT, what))
        }
    }
}

/// POST /api/sessions/{sid}/history/undo - Reverse the latest command.
pub async fn undo(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
) -> Result<Json<HistoryStepResponse>, ApiError> {
    step(&state, &sid, HistoryAction::Undo).await
}

/// POST /api/sessions/{sid}/history/redo - Reapply the next undone command.
pub async fn redo(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
) -> Result<Json<HistoryStepResponse>, ApiError> {
    step(&state, &sid, HistoryAction::Redo).await
}

/// DELETE /api/sessions/{sid}/history - Forget all history.
pub async fn clear_history(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
) -> Result<Json<HistoryStatus>, ApiError> {
    let handle = lookup_session(&state, &sid).await?;
    let mut session = handle.lock().await;
    session.clear_history();
    Ok(Json(session.history_status()))
}

/// POST /api/sessions/{sid}/shortcut - Run undo/redo for a key press if it
/// maps to one. Unhandled presses return `action: null` and change nothing.
pub async fn shortcut(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
    Json(req): Json<ShortcutRequest>,
) -> Result<Json<HistoryStepResponse>, ApiError> {
    let handle = lookup_session(&state, &sid).await?;
    let mut session = handle.lock().await;

    let Some(action) = resolve_shortcut(&req.chord, req.focus, &req.route) else {
        return Ok(Json(HistoryStepResponse {
            action: None,
            command: None,
            status: session.history_status(),
        }));
    };

    let command = session.run(action).await?;
    Ok(Json(HistoryStepResponse {
        action: Some(action),
        command,
        status: session.history_status(),
    }))
}
