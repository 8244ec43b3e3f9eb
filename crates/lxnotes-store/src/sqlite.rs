// ABOUTME: SQLite-backed NoteStore holding production notes in a single table.
// ABOUTME: Provides open, migrations, and row conversion between SQLite columns and Note.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use lxnotes_core::{
    ModuleType, Note, NoteId, NotePatch, NoteStatus, NoteStore, ProductionId, StoreError,
    UpdatedNote,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use ulid::Ulid;

/// Errors that can occur inside the SQLite note store.
#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt note row: {0}")]
    Corrupt(String),
}

impl From<SqliteError> for StoreError {
    fn from(e: SqliteError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

const NOTE_COLUMNS: &str = "id, production_id, module_type, title, description, note_type, \
     priority, status, cue_number, script_page, scene_song, channel_numbers, position_unit, \
     scenery_needs, assigned_to, created_by, due_date, created_at, updated_at";

/// A note store backed by one SQLite database file.
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
}

impl SqliteNoteStore {
    /// Open or create a note database at the given path.
    /// Runs migrations to ensure the schema is up to date.
    pub fn open(path: &Path) -> Result<Self, SqliteError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::migrate(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        Self::migrate(Connection::open_in_memory()?)
    }

    fn migrate(conn: Connection) -> Result<Self, SqliteError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                production_id TEXT NOT NULL,
                module_type TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                note_type TEXT,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                cue_number TEXT,
                script_page TEXT,
                scene_song TEXT,
                channel_numbers TEXT,
                position_unit TEXT,
                scenery_needs TEXT,
                assigned_to TEXT,
                created_by TEXT,
                due_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS notes_by_production
                ON notes (production_id, module_type);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fetch(conn: &Connection, id: NoteId) -> Result<Option<Note>, SqliteError> {
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM notes WHERE id = ?1", NOTE_COLUMNS),
                params![id.to_string()],
                RawNote::from_row,
            )
            .optional()?;
        raw.map(RawNote::into_note).transpose()
    }

    fn write(conn: &Connection, note: &Note) -> Result<(), SqliteError> {
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO notes ({}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                NOTE_COLUMNS
            ),
            params![
                note.id.to_string(),
                note.production_id.to_string(),
                note.module_type.as_str(),
                note.title,
                note.description,
                note.note_type,
                note.priority,
                note.status.as_str(),
                note.cue_number,
                note.script_page,
                note.scene_song,
                note.channel_numbers,
                note.position_unit,
                note.scenery_needs,
                note.assigned_to,
                note.created_by,
                note.due_date.map(|d| d.to_string()),
                note.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                note.updated_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn get(&self, id: NoteId) -> Result<Note, StoreError> {
        let conn = self.conn();
        Self::fetch(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    async fn list(
        &self,
        production_id: ProductionId,
        module_type: Option<ModuleType>,
    ) -> Result<Vec<Note>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM notes
                 WHERE production_id = ?1 AND (?2 IS NULL OR module_type = ?2)
                 ORDER BY created_at ASC, id ASC",
                NOTE_COLUMNS
            ))
            .map_err(SqliteError::from)?;

        let rows = stmt
            .query_map(
                params![production_id.to_string(), module_type.map(|m| m.as_str())],
                RawNote::from_row,
            )
            .map_err(SqliteError::from)?;

        let mut notes = Vec::new();
        for row in rows {
            let raw = row.map_err(SqliteError::from)?;
            notes.push(raw.into_note()?);
        }
        Ok(notes)
    }

    async fn create(&self, note: Note) -> Result<Note, StoreError> {
        let conn = self.conn();
        if Self::fetch(&conn, note.id)?.is_some() {
            return Err(StoreError::AlreadyExists(note.id));
        }
        Self::write(&conn, &note)?;
        tracing::debug!(note_id = %note.id, "note inserted");
        Ok(note)
    }

    async fn update(&self, id: NoteId, patch: NotePatch) -> Result<UpdatedNote, StoreError> {
        let conn = self.conn();
        let before = Self::fetch(&conn, id)?.ok_or(StoreError::NotFound(id))?;
        let mut after = before.clone();
        after.apply_patch(&patch);
        Self::write(&conn, &after)?;
        Ok(UpdatedNote { before, after })
    }

    async fn delete(&self, id: NoteId) -> Result<(), StoreError> {
        let conn = self.conn();
        let removed = conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id.to_string()])
            .map_err(SqliteError::from)?;
        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

/// A notes row as stored, before parsing ids, enums and timestamps.
struct RawNote {
    id: String,
    production_id: String,
    module_type: String,
    title: String,
    description: Option<String>,
    note_type: Option<String>,
    priority: String,
    status: String,
    cue_number: Option<String>,
    script_page: Option<String>,
    scene_song: Option<String>,
    channel_numbers: Option<String>,
    position_unit: Option<String>,
    scenery_needs: Option<String>,
    assigned_to: Option<String>,
    created_by: Option<String>,
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawNote {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            production_id: row.get(1)?,
            module_type: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            note_type: row.get(5)?,
            priority: row.get(6)?,
            status: row.get(7)?,
            cue_number: row.get(8)?,
            script_page: row.get(9)?,
            scene_song: row.get(10)?,
            channel_numbers: row.get(11)?,
            position_unit: row.get(12)?,
            scenery_needs: row.get(13)?,
            assigned_to: row.get(14)?,
            created_by: row.get(15)?,
            due_date: row.get(16)?,
            created_at: row.get(17)?,
            updated_at: row.get(18)?,
        })
    }

    fn into_note(self) -> Result<Note, SqliteError> {
        Ok(Note {
            id: parse_ulid(&self.id)?,
            production_id: parse_ulid(&self.production_id)?,
            module_type: ModuleType::parse(&self.module_type)
                .ok_or_else(|| SqliteError::Corrupt(format!("module_type {}", self.module_type)))?,
            title: self.title,
            description: self.description,
            note_type: self.note_type,
            priority: self.priority,
            status: NoteStatus::parse(&self.status)
                .ok_or_else(|| SqliteError::Corrupt(format!("status {}", self.status)))?,
            cue_number: self.cue_number,
            script_page: self.script_page,
            scene_song: self.scene_song,
            channel_numbers: self.channel_numbers,
            position_unit: self.position_unit,
            scenery_needs: self.scenery_needs,
            assigned_to: self.assigned_to,
            created_by: self.created_by,
            due_date: self
                .due_date
                .as_deref()
                .map(|d| {
                    d.parse::<NaiveDate>()
                        .map_err(|_| SqliteError::Corrupt(format!("due_date {}", d)))
                })
                .transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_ulid(s: &str) -> Result<Ulid, SqliteError> {
    s.parse::<Ulid>()
        .map_err(|_| SqliteError::Corrupt(format!("id {}", s)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, SqliteError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| SqliteError::Corrupt(format!("timestamp {}", s)))
}
