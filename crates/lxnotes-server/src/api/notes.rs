// ABOUTME: Note CRUD API handlers scoped to a session's current production.
// ABOUTME: Every successful mutation is recorded in the session's undo history.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use lxnotes_core::{ModuleType, NewNote, Note, NotePatch};
use serde::Deserialize;

use super::error::{ApiError, lookup_session, parse_id};
use crate::app_state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    #[serde(default)]
    pub module_type: Option<ModuleType>,
}

/// GET /api/sessions/{sid}/notes - List notes in the current production.
pub async fn list_notes(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let handle = lookup_session(&state, &sid).await?;
    let session = handle.lock().await;
    Ok(Json(session.list_notes(query.module_type).await?))
}

/// POST /api/sessions/{sid}/notes - Create a note.
pub async fn create_note(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
    Json(draft): Json<NewNote>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = lookup_session(&state, &sid).await?;
    let mut session = handle.lock().await;
    let note = session.create_note(draft).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/sessions/{sid}/notes/{note_id} - Fetch one note.
pub async fn get_note(
    State(state): State<SharedState>,
    Path((sid, note_id)): Path<(String, String)>,
) -> Result<Json<Note>, ApiError> {
    let note_id = parse_id(&note_id, "note")?;
    let handle = lookup_session(&state, &sid).await?;
    let session = handle.lock().await;
    Ok(Json(session.get_note(note_id).await?))
}

/// PATCH /api/sessions/{sid}/notes/{note_id} - Update a note.
pub async fn update_note(
    State(state): State<SharedState>,
    Path((sid, note_id)): Path<(String, String)>,
    Json(patch): Json<NotePatch>,
) -> Result<Json<Note>, ApiError> {
    let note_id = parse_id(&note_id, "note")?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("patch changes nothing"));
    }
    let handle = lookup_session(&state, &sid).await?;
    let mut session = handle.lock().await;
    Ok(Json(session.update_note(note_id, patch).await?))
}

/// DELETE /api/sessions/{sid}/notes/{note_id} - Delete a note.
pub async fn delete_note(
    State(state): State<SharedState>,
    Path((sid, note_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let note_id = parse_id(&note_id, "note")?;
    let handle = lookup_session(&state, &sid).await?;
    let mut session = handle.lock().await;
    session.delete_note(note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
