// ABOUTME: Defines UndoStack, the bounded linear undo/redo history for note commands.
// ABOUTME: Supports peek/commit undo and redo, redo-branch truncation on push, and clearing on production switch.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::command::UndoCommand;
use crate::note::ProductionId;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Snapshot of the derived selectors, for rendering undo/redo controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
}

/// A linear history of applied note commands.
///
/// `cursor` points at the most recently applied command; `None` means
/// nothing is applied (empty history, or fully rewound). Commands after the
/// cursor are available for redo until the next push discards them.
///
/// The stack never touches note data. Callers reverse a command against
/// the store first and only then call [`UndoStack::commit_undo`] or
/// [`UndoStack::commit_redo`]; skipping the commit leaves the command
/// available for a retry.
#[derive(Debug, Clone)]
pub struct UndoStack {
    history: VecDeque<UndoCommand>,
    cursor: Option<usize>,
    capacity: usize,
    scope: Option<ProductionId>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty stack that retains at most `capacity` commands
    /// (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
            scope: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn scope(&self) -> Option<ProductionId> {
        self.scope
    }

    /// Commands oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &UndoCommand> {
        self.history.iter()
    }

    /// Record a newly applied command. Any redo branch is discarded, and the
    /// oldest commands are evicted once capacity is exceeded.
    pub fn push(&mut self, command: UndoCommand) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        if keep < self.history.len() {
            tracing::debug!(
                discarded = self.history.len() - keep,
                "discarding redo branch"
            );
            self.history.truncate(keep);
        }

        self.history.push_back(command);

        while self.history.len() > self.capacity {
            if let Some(evicted) = self.history.pop_front() {
                tracing::debug!(command_id = %evicted.id, "evicting oldest history entry");
            }
        }

        self.cursor = Some(self.history.len() - 1);
    }

    /// The command an undo would reverse, without moving the cursor.
    pub fn peek_undo(&self) -> Option<&UndoCommand> {
        self.cursor.and_then(|c| self.history.get(c))
    }

    /// The command a redo would reapply, without moving the cursor.
    pub fn peek_redo(&self) -> Option<&UndoCommand> {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.history.get(next)
    }

    /// Step the cursor back one command. No-op when nothing is applied.
    pub fn commit_undo(&mut self) {
        self.cursor = match self.cursor {
            Some(0) | None => None,
            Some(c) => Some(c - 1),
        };
    }

    /// Step the cursor forward one command. No-op at the end of history.
    pub fn commit_redo(&mut self) {
        if self.can_redo() {
            self.cursor = Some(self.cursor.map_or(0, |c| c + 1));
        }
    }

    /// Peek and commit in one call. Prefer [`UndoStack::peek_undo`] plus
    /// [`UndoStack::commit_undo`] when the reversal can fail.
    pub fn undo(&mut self) -> Option<UndoCommand> {
        let command = self.peek_undo().cloned()?;
        self.commit_undo();
        Some(command)
    }

    /// Peek and commit in one call. Prefer [`UndoStack::peek_redo`] plus
    /// [`UndoStack::commit_redo`] when the replay can fail.
    pub fn redo(&mut self) -> Option<UndoCommand> {
        let command = self.peek_redo().cloned()?;
        self.commit_redo();
        Some(command)
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.cursor = None;
    }

    /// Bind the stack to a production. Switching to a different production
    /// clears the history; setting the same production again does nothing.
    pub fn set_scope(&mut self, scope: Option<ProductionId>) {
        if self.scope == scope {
            return;
        }
        tracing::debug!(
            from = ?self.scope,
            to = ?scope,
            dropped = self.history.len(),
            "production changed, clearing history"
        );
        self.clear();
        self.scope = scope;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.peek_redo().is_some()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.peek_undo().map(|c| c.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.peek_redo().map(|c| c.description.as_str())
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_description: self.undo_description().map(str::to_string),
            redo_description: self.redo_description().map(str::to_string),
        }
    }
}
