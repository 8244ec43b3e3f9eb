// ABOUTME: Defines the NoteStore trait, the persistence boundary for production notes.
// ABOUTME: Sessions perform original mutations and undo/redo reversals through this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::command::StoreOp;
use crate::note::{ModuleType, Note, NoteId, NotePatch, ProductionId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note not found: {0}")]
    NotFound(NoteId),

    #[error("note already exists: {0}")]
    AlreadyExists(NoteId),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// The row as it was just before an update, and as it is after.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedNote {
    pub before: Note,
    pub after: Note,
}

/// Authoritative storage for notes. Every method returns the record as
/// stored, which is what undo commands snapshot.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn get(&self, id: NoteId) -> Result<Note, StoreError>;

    /// Notes in a production, optionally narrowed to one module, oldest first.
    async fn list(
        &self,
        production_id: ProductionId,
        module_type: Option<ModuleType>,
    ) -> Result<Vec<Note>, StoreError>;

    /// Insert a note under its own id. Fails if the id is taken.
    async fn create(&self, note: Note) -> Result<Note, StoreError>;

    /// Apply a patch. `before` is read under the same lock or transaction as
    /// the write, so a concurrent writer can never slip between the two.
    async fn update(&self, id: NoteId, patch: NotePatch) -> Result<UpdatedNote, StoreError>;

    async fn delete(&self, id: NoteId) -> Result<(), StoreError>;
}

/// Run a reversal produced by an undo command.
pub async fn execute(store: &dyn NoteStore, op: StoreOp) -> Result<(), StoreError> {
    match op {
        StoreOp::Create(note) => store.create(note).await.map(|_| ()),
        StoreOp::Update(id, patch) => store.update(id, patch).await.map(|_| ()),
        StoreOp::Delete(id) => store.delete(id).await,
    }
}
