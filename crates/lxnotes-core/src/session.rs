// ABOUTME: Defines NotesSession, which owns one undo history and mutates notes through a NoteStore.
// ABOUTME: Undo and redo follow the peek/commit protocol so a failed store call never moves the cursor.

use std::sync::Arc;

use thiserror::Error;

use crate::command::{
    CommandError, HistoryAction, UndoCommand, make_create_command, make_delete_command,
    make_update_command,
};
use crate::note::{ModuleType, NewNote, Note, NoteId, NotePatch, ProductionId};
use crate::store::{self, NoteStore, StoreError, UpdatedNote};
use crate::undo::{HistoryStatus, UndoStack};

/// Errors that can occur when a session mutates notes or walks its history.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no production selected")]
    NoProduction,

    #[error("note {note_id} belongs to production {actual}, not {expected}")]
    WrongProduction {
        note_id: NoteId,
        expected: ProductionId,
        actual: ProductionId,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// One user's editing session. Owns its undo history; independent sessions
/// on the same production keep independent histories.
pub struct NotesSession {
    store: Arc<dyn NoteStore>,
    history: UndoStack,
    actor_id: Option<String>,
}

impl NotesSession {
    pub fn open(store: Arc<dyn NoteStore>, actor_id: Option<String>, capacity: usize) -> Self {
        Self {
            store,
            history: UndoStack::with_capacity(capacity),
            actor_id,
        }
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    pub fn production(&self) -> Option<ProductionId> {
        self.history.scope()
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    /// Select the production being edited. History from another production
    /// is dropped.
    pub fn switch_production(&mut self, production_id: ProductionId) {
        self.history.set_scope(Some(production_id));
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn current_production(&self) -> Result<ProductionId, SessionError> {
        self.history.scope().ok_or(SessionError::NoProduction)
    }

    /// Fetch a note and check it belongs to the current production.
    async fn scoped_note(&self, id: NoteId) -> Result<Note, SessionError> {
        let expected = self.current_production()?;
        let note = self.store.get(id).await?;
        if note.production_id != expected {
            return Err(SessionError::WrongProduction {
                note_id: id,
                expected,
                actual: note.production_id,
            });
        }
        Ok(note)
    }

    pub async fn get_note(&self, id: NoteId) -> Result<Note, SessionError> {
        self.scoped_note(id).await
    }

    pub async fn list_notes(
        &self,
        module_type: Option<ModuleType>,
    ) -> Result<Vec<Note>, SessionError> {
        let production_id = self.current_production()?;
        Ok(self.store.list(production_id, module_type).await?)
    }

    pub async fn create_note(&mut self, draft: NewNote) -> Result<Note, SessionError> {
        let production_id = self.current_production()?;
        let note = draft.into_note(production_id, self.actor_id.clone());
        let created = self.store.create(note).await?;
        self.history
            .push(make_create_command(&created, self.actor_id.clone()));
        Ok(created)
    }

    /// The undo snapshot is the row the store replaced, not the one read
    /// for the production check, so edits from other sessions in between
    /// survive an undo.
    pub async fn update_note(&mut self, id: NoteId, patch: NotePatch) -> Result<Note, SessionError> {
        self.scoped_note(id).await?;
        let UpdatedNote { before, after } = self.store.update(id, patch).await?;
        let command = make_update_command(&before, &after, self.actor_id.clone())?;
        self.history.push(command);
        Ok(after)
    }

    pub async fn delete_note(&mut self, id: NoteId) -> Result<Note, SessionError> {
        let before = self.scoped_note(id).await?;
        self.store.delete(id).await?;
        self.history
            .push(make_delete_command(&before, self.actor_id.clone()));
        Ok(before)
    }

    /// Reverse the most recent command. Returns `Ok(None)` when there is
    /// nothing to undo. The cursor only moves once the store accepted the
    /// reversal.
    pub async fn undo(&mut self) -> Result<Option<UndoCommand>, SessionError> {
        let Some(command) = self.history.peek_undo().cloned() else {
            return Ok(None);
        };
        self.walk(&command, HistoryAction::Undo).await?;
        self.history.commit_undo();
        Ok(Some(command))
    }

    /// Reapply the next undone command. Returns `Ok(None)` when there is
    /// nothing to redo.
    pub async fn redo(&mut self) -> Result<Option<UndoCommand>, SessionError> {
        let Some(command) = self.history.peek_redo().cloned() else {
            return Ok(None);
        };
        self.walk(&command, HistoryAction::Redo).await?;
        self.history.commit_redo();
        Ok(Some(command))
    }

    pub async fn run(&mut self, action: HistoryAction) -> Result<Option<UndoCommand>, SessionError> {
        match action {
            HistoryAction::Undo => self.undo().await,
            HistoryAction::Redo => self.redo().await,
        }
    }

    async fn walk(&self, command: &UndoCommand, action: HistoryAction) -> Result<(), SessionError> {
        let op = command.reversal(action);
        match store::execute(self.store.as_ref(), op).await {
            Ok(()) => {
                tracing::debug!(
                    command_id = %command.id,
                    ?action,
                    description = %command.description,
                    "history step applied"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    command_id = %command.id,
                    ?action,
                    error = %e,
                    "history step failed, cursor unchanged"
                );
                Err(e.into())
            }
        }
    }
}
