// ABOUTME: HTTP server for LX Notes, exposing sessions, notes, and undo/redo history.
// ABOUTME: Uses Axum with shared session state and an optional bearer token layer.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState, spawn_session_reaper};
pub use config::{ConfigError, LxNotesConfig, StoreBackend};
pub use routes::create_router;
