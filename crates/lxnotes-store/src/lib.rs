// ABOUTME: Persistence layer for LX Notes, implementing the NoteStore trait.
// ABOUTME: Provides an in-memory store and a SQLite store, plus a helper to open either.

pub mod memory;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use lxnotes_core::NoteStore;

pub use memory::MemoryNoteStore;
pub use sqlite::{SqliteError, SqliteNoteStore};

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE: &str = "lxnotes.db";

/// Open the SQLite note store under `home`, creating the directory if needed.
pub fn open_sqlite(home: &Path) -> Result<Arc<dyn NoteStore>, SqliteError> {
    std::fs::create_dir_all(home)?;
    let path = home.join(DATABASE_FILE);
    let store = SqliteNoteStore::open(&path)?;
    tracing::info!(path = %path.display(), "opened note database");
    Ok(Arc::new(store))
}
