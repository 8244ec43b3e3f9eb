// ABOUTME: API module containing all HTTP handler functions for the lxnotes REST API.
// ABOUTME: Organized into sub-modules for sessions, notes, and undo/redo history.

pub mod error;
pub mod history;
pub mod notes;
pub mod sessions;

pub use error::ApiError;
