// ABOUTME: Route definitions for the lxnotes HTTP API.
// ABOUTME: Assembles session, note, and history routes into a single Axum Router with shared state.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;
use crate::auth::BearerAuthLayer;

/// Build the complete Axum router. When `auth_token` is set, every /api
/// route requires it as a bearer token.
pub fn create_router(state: SharedState, auth_token: Option<String>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(api::sessions::open_session))
        .route(
            "/api/sessions/{sid}",
            axum::routing::delete(api::sessions::close_session),
        )
        .route(
            "/api/sessions/{sid}/production",
            put(api::sessions::switch_production),
        )
        .route(
            "/api/sessions/{sid}/notes",
            get(api::notes::list_notes).post(api::notes::create_note),
        )
        .route(
            "/api/sessions/{sid}/notes/{note_id}",
            get(api::notes::get_note)
                .patch(api::notes::update_note)
                .delete(api::notes::delete_note),
        )
        .route(
            "/api/sessions/{sid}/history",
            get(api::history::get_history).delete(api::history::clear_history),
        )
        .route("/api/sessions/{sid}/history/undo", post(api::history::undo))
        .route("/api/sessions/{sid}/history/redo", post(api::history::redo))
        .route("/api/sessions/{sid}/shortcut", post(api::history::shortcut))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match auth_token {
        Some(token) => router.layer(BearerAuthLayer::new(&token)),
        None => router,
    }
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http::Request;
    use lxnotes_core::NoteStore;
    use lxnotes_core::testing::StubNoteStore;
    use lxnotes_store::MemoryNoteStore;
    use std::sync::Arc;
    use tower::ServiceExt;
    use ulid::Ulid;

    fn test_state() -> SharedState {
        Arc::new(AppState::new(Arc::new(MemoryNoteStore::new()), 50))
    }

    /// State over a stub store the test can reach into directly.
    fn stub_state() -> (SharedState, Arc<StubNoteStore>) {
        let stub = Arc::new(StubNoteStore::new());
        let store: Arc<dyn NoteStore> = stub.clone();
        (Arc::new(AppState::new(store, 50)), stub)
    }

    async fn send(
        state: &SharedState,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let app = create_router(Arc::clone(state), None);
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Open a session bound to a fresh production and return its id.
    async fn open_session(state: &SharedState) -> String {
        let body = serde_json::json!({
            "actor_id": "lx-programmer",
            "production_id": Ulid::new().to_string(),
        });
        let (status, json) = send(state, "POST", "/api/sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        json["session_id"].as_str().unwrap().to_string()
    }

    async fn create_cue_note(state: &SharedState, sid: &str, title: &str) -> String {
        let body = serde_json::json!({ "module_type": "cue", "title": title });
        let (status, json) = send(
            state,
            "POST",
            &format!("/api/sessions/{}/notes", sid),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (status, json) = send(&test_state(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn create_then_undo_and_redo() {
        let state = test_state();
        let sid = open_session(&state).await;
        create_cue_note(&state, &sid, "Q7 sunrise too fast").await;

        let (_, history) = send(&state, "GET", &format!("/api/sessions/{}/history", sid), None).await;
        assert_eq!(history["can_undo"], true);
        assert_eq!(history["undo_description"], "Created: Q7 sunrise too fast");

        let (status, json) = send(
            &state,
            "POST",
            &format!("/api/sessions/{}/history/undo", sid),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["action"], "undo");
        assert_eq!(json["status"]["can_redo"], true);

        let (_, notes) = send(&state, "GET", &format!("/api/sessions/{}/notes", sid), None).await;
        assert_eq!(notes.as_array().unwrap().len(), 0);

        let (status, _) = send(
            &state,
            "POST",
            &format!("/api/sessions/{}/history/redo", sid),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, notes) = send(&state, "GET", &format!("/api/sessions/{}/notes", sid), None).await;
        assert_eq!(notes.as_array().unwrap().len(), 1);
        assert_eq!(notes[0]["title"], "Q7 sunrise too fast");
    }

    #[tokio::test]
    async fn undo_with_empty_history_conflicts() {
        let state = test_state();
        let sid = open_session(&state).await;

        let (status, json) = send(
            &state,
            "POST",
            &format!("/api/sessions/{}/history/undo", sid),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "nothing to undo");
    }

    #[tokio::test]
    async fn update_and_delete_are_undoable() {
        let state = test_state();
        let sid = open_session(&state).await;
        let note_id = create_cue_note(&state, &sid, "Q3").await;
        let note_uri = format!("/api/sessions/{}/notes/{}", sid, note_id);

        let (status, json) = send(
            &state,
            "PATCH",
            &note_uri,
            Some(serde_json::json!({ "status": "complete" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "complete");

        let (status, _) = send(&state, "DELETE", &note_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, "GET", &note_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Undo the delete, then the update.
        send(&state, "POST", &format!("/api/sessions/{}/history/undo", sid), None).await;
        let (_, json) = send(&state, "GET", &note_uri, None).await;
        assert_eq!(json["status"], "complete");

        send(&state, "POST", &format!("/api/sessions/{}/history/undo", sid), None).await;
        let (_, json) = send(&state, "GET", &note_uri, None).await;
        assert_eq!(json["status"], "todo");
    }

    #[tokio::test]
    async fn backend_failure_on_undo_is_bad_gateway_and_retryable() {
        let (state, stub) = stub_state();
        let sid = open_session(&state).await;
        let note_id: Ulid = create_cue_note(&state, &sid, "Q11 blackout").await.parse().unwrap();
        let undo_uri = format!("/api/sessions/{}/history/undo", sid);

        stub.fail_next_call();
        let (status, json) = send(&state, "POST", &undo_uri, None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["error"].as_str().unwrap().contains("injected failure"));
        assert!(stub.contains(note_id));

        let (status, history) = send(&state, "GET", &format!("/api/sessions/{}/history", sid), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["can_undo"], true);
        assert_eq!(history["undo_description"], "Created: Q11 blackout");

        let (status, json) = send(&state, "POST", &undo_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"]["can_undo"], false);
        assert!(!stub.contains(note_id));
    }

    #[tokio::test]
    async fn undoing_delete_conflicts_when_id_was_reused() {
        let (state, stub) = stub_state();
        let sid = open_session(&state).await;
        let raw_id = create_cue_note(&state, &sid, "Q8 preset").await;
        let note_id: Ulid = raw_id.parse().unwrap();
        let snapshot = stub.snapshot(note_id).unwrap();

        let (status, _) = send(
            &state,
            "DELETE",
            &format!("/api/sessions/{}/notes/{}", sid, raw_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // Another writer puts a row back under the same id.
        stub.create(snapshot).await.unwrap();

        let (status, json) = send(
            &state,
            "POST",
            &format!("/api/sessions/{}/history/undo", sid),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(json["error"].as_str().unwrap().contains("already exists"));

        let (_, history) = send(&state, "GET", &format!("/api/sessions/{}/history", sid), None).await;
        assert_eq!(history["undo_description"], "Deleted: Q8 preset");
    }

    #[tokio::test]
    async fn notes_from_previous_production_are_not_found() {
        let state = test_state();
        let sid = open_session(&state).await;
        let note_id = create_cue_note(&state, &sid, "Q2 house to half").await;
        let note_uri = format!("/api/sessions/{}/notes/{}", sid, note_id);

        let (status, _) = send(&state, "GET", &note_uri, None).await;
        assert_eq!(status, StatusCode::OK);

        send(
            &state,
            "PUT",
            &format!("/api/sessions/{}/production", sid),
            Some(serde_json::json!({ "production_id": Ulid::new().to_string() })),
        )
        .await;

        let (status, json) = send(&state, "GET", &note_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("belongs to production"));
    }

    #[tokio::test]
    async fn empty_patch_is_rejected_without_recording_history() {
        let state = test_state();
        let sid = open_session(&state).await;
        let note_id = create_cue_note(&state, &sid, "Q3").await;

        let (status, json) = send(
            &state,
            "PATCH",
            &format!("/api/sessions/{}/notes/{}", sid, note_id),
            Some(serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "patch changes nothing");

        let (_, history) = send(&state, "GET", &format!("/api/sessions/{}/history", sid), None).await;
        assert_eq!(history["undo_description"], "Created: Q3");
    }

    #[tokio::test]
    async fn switching_production_clears_history() {
        let state = test_state();
        let sid = open_session(&state).await;
        create_cue_note(&state, &sid, "Q1").await;

        let (status, json) = send(
            &state,
            "PUT",
            &format!("/api/sessions/{}/production", sid),
            Some(serde_json::json!({ "production_id": Ulid::new().to_string() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["can_undo"], false);
        assert_eq!(json["can_redo"], false);
    }

    #[tokio::test]
    async fn session_without_production_rejects_notes() {
        let state = test_state();
        let (_, json) = send(&state, "POST", "/api/sessions", Some(serde_json::json!({}))).await;
        let sid = json["session_id"].as_str().unwrap().to_string();

        let (status, json) = send(
            &state,
            "POST",
            &format!("/api/sessions/{}/notes", sid),
            Some(serde_json::json!({ "module_type": "work", "title": "Focus" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "no production selected");
    }

    #[tokio::test]
    async fn shortcut_runs_undo_outside_text_fields() {
        let state = test_state();
        let sid = open_session(&state).await;
        create_cue_note(&state, &sid, "Q2").await;
        let uri = format!("/api/sessions/{}/shortcut", sid);

        let (status, json) = send(
            &state,
            "POST",
            &uri,
            Some(serde_json::json!({
                "chord": { "key": "z", "ctrl": true },
                "focus": "text_area",
                "route": "/cue-notes",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["action"].is_null());
        assert_eq!(json["status"]["can_undo"], true);

        let (status, json) = send(
            &state,
            "POST",
            &uri,
            Some(serde_json::json!({
                "chord": { "key": "z", "meta": true },
                "route": "/cue-notes",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["action"], "undo");
        assert_eq!(json["command"]["description"], "Created: Q2");
        assert_eq!(json["status"]["can_undo"], false);
    }

    #[tokio::test]
    async fn unknown_and_malformed_sessions() {
        let state = test_state();

        let (status, _) = send(&state, "GET", "/api/sessions/not-a-ulid/history", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &state,
            "GET",
            &format!("/api/sessions/{}/history", Ulid::new()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn closed_session_is_gone() {
        let state = test_state();
        let sid = open_session(&state).await;

        let (status, _) = send(&state, "DELETE", &format!("/api/sessions/{}", sid), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&state, "GET", &format!("/api/sessions/{}/history", sid), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_requires_token_when_configured() {
        let app = create_router(test_state(), Some("fly-rail".to_string()));
        let resp = app
            .oneshot(
                Request::post("/api/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
