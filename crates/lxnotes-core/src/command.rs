// ABOUTME: Defines UndoCommand, an immutable record of one reversible note mutation.
// ABOUTME: Provides the create/update/delete constructors and the store operation that reverses or replays each one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

use crate::note::{ModuleType, Note, NoteId, NotePatch};

/// Titles longer than this are cut in command descriptions.
pub const TITLE_PREVIEW_CHARS: usize = 30;

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("update snapshots disagree on note identity: before {before}, after {after}")]
    IdentityMismatch { before: NoteId, after: NoteId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Create,
    Update,
    Delete,
}

/// The kind of entity a command touches. Only notes are tracked today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Note,
}

/// The before/after snapshots of a mutation. Which snapshots exist is
/// fixed by the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NoteChange {
    Created { next: Note },
    Updated { previous: Note, next: Note },
    Deleted { previous: Note },
}

/// Which way a command is being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Undo,
    Redo,
}

/// A call against the notes store that undoes or replays a command.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Create(Note),
    Update(NoteId, NotePatch),
    Delete(NoteId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoCommand {
    pub id: Ulid,
    pub timestamp: DateTime<Utc>,
    pub actor_id: Option<String>,
    pub entity: EntityKind,
    pub entity_id: NoteId,
    pub module_type: ModuleType,
    pub description: String,
    pub change: NoteChange,
}

impl UndoCommand {
    fn build(note: &Note, verb: &str, actor_id: Option<String>, change: NoteChange) -> Self {
        Self {
            id: Ulid::new(),
            timestamp: Utc::now(),
            actor_id,
            entity: EntityKind::Note,
            entity_id: note.id,
            module_type: note.module_type,
            description: format!("{}: {}", verb, truncated_title(Some(note))),
            change,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self.change {
            NoteChange::Created { .. } => CommandKind::Create,
            NoteChange::Updated { .. } => CommandKind::Update,
            NoteChange::Deleted { .. } => CommandKind::Delete,
        }
    }

    /// The note as it was before the mutation. Absent for creates.
    pub fn previous_state(&self) -> Option<&Note> {
        match &self.change {
            NoteChange::Created { .. } => None,
            NoteChange::Updated { previous, .. } | NoteChange::Deleted { previous } => {
                Some(previous)
            }
        }
    }

    /// The note as it was after the mutation. Absent for deletes.
    pub fn next_state(&self) -> Option<&Note> {
        match &self.change {
            NoteChange::Created { next } | NoteChange::Updated { next, .. } => Some(next),
            NoteChange::Deleted { .. } => None,
        }
    }

    /// The store call that walks this command in the given direction.
    /// Undoing a delete recreates the note under its original id.
    pub fn reversal(&self, action: HistoryAction) -> StoreOp {
        match (&self.change, action) {
            (NoteChange::Created { .. }, HistoryAction::Undo) => StoreOp::Delete(self.entity_id),
            (NoteChange::Created { next }, HistoryAction::Redo) => StoreOp::Create(next.clone()),
            (NoteChange::Updated { previous, .. }, HistoryAction::Undo) => {
                StoreOp::Update(self.entity_id, NotePatch::restore(previous))
            }
            (NoteChange::Updated { next, .. }, HistoryAction::Redo) => {
                StoreOp::Update(self.entity_id, NotePatch::restore(next))
            }
            (NoteChange::Deleted { previous }, HistoryAction::Undo) => {
                StoreOp::Create(previous.clone())
            }
            (NoteChange::Deleted { .. }, HistoryAction::Redo) => StoreOp::Delete(self.entity_id),
        }
    }
}

pub fn make_create_command(new_note: &Note, actor_id: Option<String>) -> UndoCommand {
    UndoCommand::build(
        new_note,
        "Created",
        actor_id,
        NoteChange::Created {
            next: new_note.clone(),
        },
    )
}

/// Both snapshots must describe the same note.
pub fn make_update_command(
    old_note: &Note,
    new_note: &Note,
    actor_id: Option<String>,
) -> Result<UndoCommand, CommandError> {
    if old_note.id != new_note.id {
        return Err(CommandError::IdentityMismatch {
            before: old_note.id,
            after: new_note.id,
        });
    }
    Ok(UndoCommand::build(
        new_note,
        "Edited",
        actor_id,
        NoteChange::Updated {
            previous: old_note.clone(),
            next: new_note.clone(),
        },
    ))
}

pub fn make_delete_command(deleted_note: &Note, actor_id: Option<String>) -> UndoCommand {
    UndoCommand::build(
        deleted_note,
        "Deleted",
        actor_id,
        NoteChange::Deleted {
            previous: deleted_note.clone(),
        },
    )
}

/// A short label for a note: the title cut to 30 characters plus "...",
/// or "note" when there is no note or its title is blank.
pub fn truncated_title(note: Option<&Note>) -> String {
    let Some(title) = note.map(|n| n.title.as_str()).filter(|t| !t.trim().is_empty()) else {
        return "note".to_string();
    };

    match title.char_indices().nth(TITLE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &title[..cut]),
        None => title.to_string(),
    }
}
