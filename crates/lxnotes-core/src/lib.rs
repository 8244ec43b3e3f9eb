// ABOUTME: Core library for LX Notes, containing the note model and the undo/redo history.
// ABOUTME: Defines commands, the bounded undo stack, the note store boundary, and editing sessions.

pub mod command;
pub mod note;
pub mod session;
pub mod shortcut;
pub mod store;
pub mod testing;
pub mod undo;

pub use command::{
    CommandError, CommandKind, EntityKind, HistoryAction, NoteChange, StoreOp, UndoCommand,
    make_create_command, make_delete_command, make_update_command, truncated_title,
};
pub use note::{ModuleType, NewNote, Note, NoteId, NotePatch, NoteStatus, ProductionId};
pub use session::{NotesSession, SessionError};
pub use shortcut::{FocusTarget, KeyChord, resolve_shortcut};
pub use store::{NoteStore, StoreError, UpdatedNote};
pub use undo::{DEFAULT_HISTORY_CAPACITY, HistoryStatus, UndoStack};
