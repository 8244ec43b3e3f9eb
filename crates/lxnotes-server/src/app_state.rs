// ABOUTME: Shared application state for the lxnotes HTTP server.
// ABOUTME: Holds the note store and every open editing session, closing sessions left idle too long.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lxnotes_core::{NoteStore, NotesSession, ProductionId};
use lxnotes_store::{MemoryNoteStore, SqliteError};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use ulid::Ulid;

use crate::config::{LxNotesConfig, StoreBackend};

pub type SessionHandle = Arc<Mutex<NotesSession>>;

/// An open session and when a request last reached it.
struct SessionSlot {
    handle: SessionHandle,
    last_seen: std::sync::Mutex<Instant>,
}

impl SessionSlot {
    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_at(&self, now: Instant) -> Duration {
        let last_seen = *self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        now.saturating_duration_since(last_seen)
    }
}

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub store: Arc<dyn NoteStore>,
    /// Open sessions. Each owns its own undo history.
    sessions: RwLock<HashMap<Ulid, SessionSlot>>,
    pub history_capacity: usize,
    /// Sessions idle longer than this are closed by [`AppState::reap_idle`].
    pub session_idle: Option<Duration>,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn NoteStore>, history_capacity: usize) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
            history_capacity,
            session_idle: None,
        }
    }

    pub fn with_session_idle(mut self, idle: Option<Duration>) -> Self {
        self.session_idle = idle;
        self
    }

    /// Build state from configuration, opening the configured note store.
    pub fn from_config(config: &LxNotesConfig) -> Result<Self, SqliteError> {
        let store: Arc<dyn NoteStore> = match config.store {
            StoreBackend::Sqlite => lxnotes_store::open_sqlite(&config.home)?,
            StoreBackend::Memory => {
                tracing::warn!("using in-memory note store; notes are lost on exit");
                Arc::new(MemoryNoteStore::new())
            }
        };
        Ok(Self::new(store, config.history_capacity).with_session_idle(config.session_idle))
    }

    /// Open a session, optionally already bound to a production.
    pub async fn open_session(
        &self,
        actor_id: Option<String>,
        production_id: Option<ProductionId>,
    ) -> Ulid {
        let mut session =
            NotesSession::open(Arc::clone(&self.store), actor_id, self.history_capacity);
        if let Some(p) = production_id {
            session.switch_production(p);
        }

        let session_id = Ulid::new();
        let slot = SessionSlot {
            handle: Arc::new(Mutex::new(session)),
            last_seen: std::sync::Mutex::new(Instant::now()),
        };
        self.sessions.write().await.insert(session_id, slot);
        tracing::info!(%session_id, production = ?production_id, "session opened");
        session_id
    }

    /// Look up a session, marking it as recently used.
    pub async fn session(&self, session_id: &Ulid) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        let slot = sessions.get(session_id)?;
        slot.touch();
        Some(Arc::clone(&slot.handle))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Close a session and drop its history. Returns false if it was unknown.
    pub async fn close_session(&self, session_id: &Ulid) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(%session_id, "session closed");
        }
        removed
    }

    /// Close every session idle for longer than `session_idle` as of `now`.
    /// Returns how many were closed.
    pub async fn reap_idle(&self, now: Instant) -> usize {
        let Some(limit) = self.session_idle else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|session_id, slot| {
            let keep = slot.idle_at(now) <= limit;
            if !keep {
                tracing::info!(%session_id, "closing idle session");
            }
            keep
        });
        before - sessions.len()
    }
}

/// Periodically close idle sessions. Returns `None` when expiry is disabled.
pub fn spawn_session_reaper(state: SharedState) -> Option<JoinHandle<()>> {
    let limit = state.session_idle?;
    let period = (limit / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let closed = state.reap_idle(Instant::now()).await;
            if closed > 0 {
                tracing::debug!(closed, "reaped idle sessions");
            }
        }
    }))
}
