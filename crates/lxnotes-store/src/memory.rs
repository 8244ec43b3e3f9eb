// ABOUTME: In-memory NoteStore for ephemeral servers and tests.
// ABOUTME: Notes live in a BTreeMap behind a tokio RwLock and vanish with the process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use lxnotes_core::{
    ModuleType, Note, NoteId, NotePatch, NoteStore, ProductionId, StoreError, UpdatedNote,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notes: RwLock<BTreeMap<NoteId, Note>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn get(&self, id: NoteId) -> Result<Note, StoreError> {
        self.notes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(
        &self,
        production_id: ProductionId,
        module_type: Option<ModuleType>,
    ) -> Result<Vec<Note>, StoreError> {
        let notes = self.notes.read().await;
        let mut found: Vec<Note> = notes
            .values()
            .filter(|n| n.production_id == production_id)
            .filter(|n| module_type.is_none_or(|m| n.module_type == m))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn create(&self, note: Note) -> Result<Note, StoreError> {
        let mut notes = self.notes.write().await;
        if notes.contains_key(&note.id) {
            return Err(StoreError::AlreadyExists(note.id));
        }
        notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(&self, id: NoteId, patch: NotePatch) -> Result<UpdatedNote, StoreError> {
        let mut notes = self.notes.write().await;
        let note = notes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let before = note.clone();
        note.apply_patch(&patch);
        Ok(UpdatedNote {
            before,
            after: note.clone(),
        })
    }

    async fn delete(&self, id: NoteId) -> Result<(), StoreError> {
        self.notes
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[tokio::test]
    async fn create_get_delete() {
        let store = MemoryNoteStore::new();
        let note = Note::new(Ulid::new(), ModuleType::Cue, "Q20 snap".to_string());

        store.create(note.clone()).await.unwrap();
        assert_eq!(store.get(note.id).await.unwrap(), note);
        assert_eq!(store.len().await, 1);

        store.delete(note.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.get(note.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_returns_the_replaced_row() {
        let store = MemoryNoteStore::new();
        let note = Note::new(Ulid::new(), ModuleType::Cue, "Q4 follow".to_string());
        store.create(note.clone()).await.unwrap();

        let updated = store
            .update(
                note.id,
                NotePatch {
                    cue_number: Some(Some("4".to_string())),
                    ..NotePatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.before, note);
        assert_eq!(updated.after.cue_number.as_deref(), Some("4"));
        assert_eq!(store.get(note.id).await.unwrap(), updated.after);
    }

    #[tokio::test]
    async fn recreating_a_deleted_note_keeps_its_id() {
        let store = MemoryNoteStore::new();
        let note = Note::new(Ulid::new(), ModuleType::Actor, "Mic pack".to_string());

        store.create(note.clone()).await.unwrap();
        assert!(matches!(
            store.create(note.clone()).await,
            Err(StoreError::AlreadyExists(_))
        ));

        store.delete(note.id).await.unwrap();
        let recreated = store.create(note.clone()).await.unwrap();
        assert_eq!(recreated.id, note.id);
    }

    #[tokio::test]
    async fn list_orders_by_creation() {
        let store = MemoryNoteStore::new();
        let production = Ulid::new();
        let first = Note::new(production, ModuleType::Work, "First".to_string());
        let mut second = Note::new(production, ModuleType::Work, "Second".to_string());
        second.created_at = first.created_at + chrono::Duration::seconds(1);

        store.create(second).await.unwrap();
        store.create(first).await.unwrap();

        let titles: Vec<String> = store
            .list(production, Some(ModuleType::Work))
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }
}
