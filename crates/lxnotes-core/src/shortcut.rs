// ABOUTME: Resolves keyboard chords to undo/redo history actions for notes-editing views.
// ABOUTME: Leaves text fields alone so native text undo keeps working.

use serde::{Deserialize, Serialize};

use crate::command::HistoryAction;

/// Routes whose views edit notes. Sub-paths of these count too.
pub const NOTES_ROUTES: [&str; 4] = [
    "/cue-notes",
    "/work-notes",
    "/production-notes",
    "/actor-notes",
];

/// A key press with its modifiers, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

/// What currently has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    TextInput,
    TextArea,
    ContentEditable,
    #[default]
    Other,
}

impl FocusTarget {
    pub fn edits_text(&self) -> bool {
        !matches!(self, FocusTarget::Other)
    }
}

pub fn is_notes_route(route: &str) -> bool {
    let path = route.split(['?', '#']).next().unwrap_or_default();
    NOTES_ROUTES.iter().any(|base| {
        path.strip_prefix(base)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Ctrl/Cmd+Z undoes, Ctrl/Cmd+Shift+Z redoes. Anything else, a focused
/// text control, or a route outside the notes views yields `None`.
pub fn resolve_shortcut(
    chord: &KeyChord,
    focus: FocusTarget,
    route: &str,
) -> Option<HistoryAction> {
    if focus.edits_text() || !is_notes_route(route) {
        return None;
    }
    if !(chord.ctrl || chord.meta) || chord.alt {
        return None;
    }
    if !chord.key.eq_ignore_ascii_case("z") {
        return None;
    }

    if chord.shift {
        Some(HistoryAction::Redo)
    } else {
        Some(HistoryAction::Undo)
    }
}
