// ABOUTME: Defines the Note struct and its create/patch payloads for production notes.
// ABOUTME: Notes belong to a production and a module (cue, work, production, actor).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

pub type NoteId = Ulid;
pub type ProductionId = Ulid;

/// The logical notes module a note lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Cue,
    Work,
    Production,
    Actor,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Cue => "cue",
            ModuleType::Work => "work",
            ModuleType::Production => "production",
            ModuleType::Actor => "actor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cue" => Some(ModuleType::Cue),
            "work" => Some(ModuleType::Work),
            "production" => Some(ModuleType::Production),
            "actor" => Some(ModuleType::Actor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    #[default]
    Todo,
    Complete,
    Cancelled,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Todo => "todo",
            NoteStatus::Complete => "complete",
            NoteStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(NoteStatus::Todo),
            "complete" => Some(NoteStatus::Complete),
            "cancelled" => Some(NoteStatus::Cancelled),
            _ => None,
        }
    }
}

pub const DEFAULT_PRIORITY: &str = "medium";

/// A single production note. This is the full snapshot carried by undo
/// commands and returned by note stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub production_id: ProductionId,
    pub module_type: ModuleType,
    pub title: String,
    pub description: Option<String>,
    pub note_type: Option<String>,
    pub priority: String,
    pub status: NoteStatus,
    pub cue_number: Option<String>,
    pub script_page: Option<String>,
    pub scene_song: Option<String>,
    pub channel_numbers: Option<String>,
    pub position_unit: Option<String>,
    pub scenery_needs: Option<String>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a note with a fresh ULID, default priority and status, and
    /// both timestamps set to now.
    pub fn new(production_id: ProductionId, module_type: ModuleType, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            production_id,
            module_type,
            title,
            description: None,
            note_type: None,
            priority: DEFAULT_PRIORITY.to_string(),
            status: NoteStatus::Todo,
            cue_number: None,
            script_page: None,
            scene_song: None,
            channel_numbers: None,
            position_unit: None,
            scenery_needs: None,
            assigned_to: None,
            created_by: None,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch in place. Only fields present in the patch change;
    /// `updated_at` is bumped whenever anything is applied.
    pub fn apply_patch(&mut self, patch: &NotePatch) {
        if let Some(t) = &patch.title {
            self.title = t.clone();
        }
        if let Some(d) = &patch.description {
            self.description = d.clone();
        }
        if let Some(t) = &patch.note_type {
            self.note_type = t.clone();
        }
        if let Some(p) = &patch.priority {
            self.priority = p.clone();
        }
        if let Some(s) = patch.status {
            self.status = s;
        }
        if let Some(c) = &patch.cue_number {
            self.cue_number = c.clone();
        }
        if let Some(s) = &patch.script_page {
            self.script_page = s.clone();
        }
        if let Some(s) = &patch.scene_song {
            self.scene_song = s.clone();
        }
        if let Some(c) = &patch.channel_numbers {
            self.channel_numbers = c.clone();
        }
        if let Some(p) = &patch.position_unit {
            self.position_unit = p.clone();
        }
        if let Some(s) = &patch.scenery_needs {
            self.scenery_needs = s.clone();
        }
        if let Some(a) = &patch.assigned_to {
            self.assigned_to = a.clone();
        }
        if let Some(d) = patch.due_date {
            self.due_date = d;
        }
        self.updated_at = Utc::now();
    }
}

/// Payload for creating a note. The session stamps the production, id,
/// author and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub module_type: ModuleType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub note_type: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<NoteStatus>,
    #[serde(default)]
    pub cue_number: Option<String>,
    #[serde(default)]
    pub script_page: Option<String>,
    #[serde(default)]
    pub scene_song: Option<String>,
    #[serde(default)]
    pub channel_numbers: Option<String>,
    #[serde(default)]
    pub position_unit: Option<String>,
    #[serde(default)]
    pub scenery_needs: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewNote {
    pub fn new(module_type: ModuleType, title: impl Into<String>) -> Self {
        Self {
            module_type,
            title: title.into(),
            description: None,
            note_type: None,
            priority: None,
            status: None,
            cue_number: None,
            script_page: None,
            scene_song: None,
            channel_numbers: None,
            position_unit: None,
            scenery_needs: None,
            assigned_to: None,
            due_date: None,
        }
    }

    /// Materialize into a full note for the given production.
    pub fn into_note(self, production_id: ProductionId, created_by: Option<String>) -> Note {
        let mut note = Note::new(production_id, self.module_type, self.title);
        note.description = self.description;
        note.note_type = self.note_type;
        if let Some(p) = self.priority {
            note.priority = p;
        }
        if let Some(s) = self.status {
            note.status = s;
        }
        note.cue_number = self.cue_number;
        note.script_page = self.script_page;
        note.scene_song = self.scene_song;
        note.channel_numbers = self.channel_numbers;
        note.position_unit = self.position_unit;
        note.scenery_needs = self.scenery_needs;
        note.assigned_to = self.assigned_to;
        note.due_date = self.due_date;
        note.created_by = created_by;
        note
    }
}

/// A partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub note_type: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<NoteStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub cue_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub script_page: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scene_song: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub channel_numbers: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub position_unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scenery_needs: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl NotePatch {
    /// Build a patch that sets every editable field back to `note`.
    pub fn restore(note: &Note) -> Self {
        Self {
            title: Some(note.title.clone()),
            description: Some(note.description.clone()),
            note_type: Some(note.note_type.clone()),
            priority: Some(note.priority.clone()),
            status: Some(note.status),
            cue_number: Some(note.cue_number.clone()),
            script_page: Some(note.script_page.clone()),
            scene_song: Some(note.scene_song.clone()),
            channel_numbers: Some(note.channel_numbers.clone()),
            position_unit: Some(note.position_unit.clone()),
            scenery_needs: Some(note.scenery_needs.clone()),
            assigned_to: Some(note.assigned_to.clone()),
            due_date: Some(note.due_date),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) when deserializing patches.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_new_sets_defaults() {
        let production = Ulid::new();
        let note = Note::new(production, ModuleType::Cue, "Fix LX 12 fade".to_string());

        assert_eq!(note.production_id, production);
        assert_eq!(note.module_type, ModuleType::Cue);
        assert_eq!(note.priority, "medium");
        assert_eq!(note.status, NoteStatus::Todo);
        assert!(note.description.is_none());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn apply_patch_only_touches_present_fields() {
        let mut note = Note::new(Ulid::new(), ModuleType::Work, "Refocus SR boom".to_string());
        note.channel_numbers = Some("101-104".to_string());

        note.apply_patch(&NotePatch {
            title: Some("Refocus SL boom".to_string()),
            status: Some(NoteStatus::Complete),
            ..NotePatch::default()
        });

        assert_eq!(note.title, "Refocus SL boom");
        assert_eq!(note.status, NoteStatus::Complete);
        assert_eq!(note.channel_numbers.as_deref(), Some("101-104"));
    }

    #[test]
    fn patch_can_clear_nullable_field() {
        let mut note = Note::new(Ulid::new(), ModuleType::Cue, "Q5".to_string());
        note.cue_number = Some("5".to_string());

        note.apply_patch(&NotePatch {
            cue_number: Some(None),
            ..NotePatch::default()
        });

        assert!(note.cue_number.is_none());
    }

    #[test]
    fn restore_patch_reverts_every_editable_field() {
        let original = Note::new(Ulid::new(), ModuleType::Actor, "Costume check".to_string());
        let mut edited = original.clone();
        edited.apply_patch(&NotePatch {
            title: Some("Wig check".to_string()),
            description: Some(Some("Act 2".to_string())),
            priority: Some("high".to_string()),
            ..NotePatch::default()
        });

        edited.apply_patch(&NotePatch::restore(&original));

        assert_eq!(edited.title, original.title);
        assert_eq!(edited.description, original.description);
        assert_eq!(edited.priority, original.priority);
    }

    #[test]
    fn patch_json_distinguishes_null_from_absent() {
        let patch: NotePatch =
            serde_json::from_str(r#"{"description": null, "title": "Q7"}"#).unwrap();

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.title.as_deref(), Some("Q7"));
        assert!(patch.cue_number.is_none());
    }

    #[test]
    fn module_type_parses_wire_names() {
        for module in [
            ModuleType::Cue,
            ModuleType::Work,
            ModuleType::Production,
            ModuleType::Actor,
        ] {
            assert_eq!(ModuleType::parse(module.as_str()), Some(module));
        }
        assert_eq!(ModuleType::parse("props"), None);
    }

    #[test]
    fn new_note_fills_optional_fields() {
        let mut draft = NewNote::new(ModuleType::Cue, "Q12 too bright");
        draft.cue_number = Some("12".to_string());
        draft.priority = Some("high".to_string());

        let production = Ulid::new();
        let note = draft.into_note(production, Some("designer".to_string()));

        assert_eq!(note.production_id, production);
        assert_eq!(note.cue_number.as_deref(), Some("12"));
        assert_eq!(note.priority, "high");
        assert_eq!(note.created_by.as_deref(), Some("designer"));
    }
}
