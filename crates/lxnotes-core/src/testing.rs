// ABOUTME: Test utilities for lxnotes-core, including a stub note store.
// ABOUTME: The stub can be told to fail its next call to exercise failed undo/redo reversals.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::note::{ModuleType, Note, NoteId, NotePatch, ProductionId};
use crate::store::{NoteStore, StoreError, UpdatedNote};

/// A map-backed note store for tests.
#[derive(Debug, Default)]
pub struct StubNoteStore {
    notes: Mutex<BTreeMap<NoteId, Note>>,
    fail_next: AtomicBool,
}

impl StubNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call return a backend error.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn snapshot(&self, id: NoteId) -> Option<Note> {
        self.lock().get(&id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<NoteId, Note>> {
        self.notes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for StubNoteStore {
    async fn get(&self, id: NoteId) -> Result<Note, StoreError> {
        self.check_failure()?;
        self.snapshot(id).ok_or(StoreError::NotFound(id))
    }

    async fn list(
        &self,
        production_id: ProductionId,
        module_type: Option<ModuleType>,
    ) -> Result<Vec<Note>, StoreError> {
        self.check_failure()?;
        Ok(self
            .lock()
            .values()
            .filter(|n| n.production_id == production_id)
            .filter(|n| module_type.is_none_or(|m| n.module_type == m))
            .cloned()
            .collect())
    }

    async fn create(&self, note: Note) -> Result<Note, StoreError> {
        self.check_failure()?;
        let mut notes = self.lock();
        if notes.contains_key(&note.id) {
            return Err(StoreError::AlreadyExists(note.id));
        }
        notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(&self, id: NoteId, patch: NotePatch) -> Result<UpdatedNote, StoreError> {
        self.check_failure()?;
        let mut notes = self.lock();
        let note = notes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let before = note.clone();
        note.apply_patch(&patch);
        Ok(UpdatedNote {
            before,
            after: note.clone(),
        })
    }

    async fn delete(&self, id: NoteId) -> Result<(), StoreError> {
        self.check_failure()?;
        self.lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
