// ABOUTME: Configuration loading and validation for the lxnotes server.
// ABOUTME: Reads LXNOTES_* environment variables and enforces remote-access constraints.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use lxnotes_core::DEFAULT_HISTORY_CAPACITY;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LXNOTES_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("LXNOTES_BIND {0} is not a loopback address; set LXNOTES_ALLOW_REMOTE=true to expose it")]
    RemoteBindNotAllowed(SocketAddr),

    #[error("LXNOTES_ALLOW_REMOTE is true but LXNOTES_AUTH_TOKEN is not set; refusing to start without authentication")]
    RemoteWithoutToken,

    #[error("LXNOTES_HISTORY_CAPACITY must be a positive integer, got {0:?}")]
    InvalidHistoryCapacity(String),

    #[error("LXNOTES_SESSION_IDLE_SECS must be a whole number of seconds, got {0:?}")]
    InvalidSessionIdle(String),

    #[error("LXNOTES_STORE must be \"sqlite\" or \"memory\", got {0:?}")]
    InvalidStore(String),
}

/// Where notes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LxNotesConfig {
    pub home: PathBuf,
    pub bind: SocketAddr,
    pub allow_remote: bool,
    pub auth_token: Option<String>,
    pub history_capacity: usize,
    /// Sessions untouched for this long are closed. `None` keeps them forever.
    pub session_idle: Option<Duration>,
    pub store: StoreBackend,
}

/// Default idle time before an abandoned session is closed: twelve hours.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 12 * 60 * 60;

impl LxNotesConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - LXNOTES_HOME: data directory (default: ~/.lxnotes)
    /// - LXNOTES_BIND: socket address to bind (default: 127.0.0.1:7340)
    /// - LXNOTES_ALLOW_REMOTE: allow non-loopback binds (default: false)
    /// - LXNOTES_AUTH_TOKEN: bearer token for API auth (optional)
    /// - LXNOTES_HISTORY_CAPACITY: undo entries kept per session (default: 50)
    /// - LXNOTES_SESSION_IDLE_SECS: close sessions idle this long, 0 disables (default: 43200)
    /// - LXNOTES_STORE: "sqlite" or "memory" (default: sqlite)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = lookup("LXNOTES_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                lookup("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".lxnotes")
            });

        let bind_str = lookup("LXNOTES_BIND").unwrap_or_else(|| "127.0.0.1:7340".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let allow_remote = lookup("LXNOTES_ALLOW_REMOTE")
            .map(|v| v == "true" || v == "1" || v == "yes")
            .unwrap_or(false);

        let auth_token = lookup("LXNOTES_AUTH_TOKEN").filter(|t| !t.is_empty());

        let history_capacity = match lookup("LXNOTES_HISTORY_CAPACITY") {
            None => DEFAULT_HISTORY_CAPACITY,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidHistoryCapacity(raw)),
            },
        };

        let session_idle_secs = match lookup("LXNOTES_SESSION_IDLE_SECS") {
            None => DEFAULT_SESSION_IDLE_SECS,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSessionIdle(raw))?,
        };
        let session_idle = (session_idle_secs > 0).then(|| Duration::from_secs(session_idle_secs));

        let store = match lookup("LXNOTES_STORE").as_deref() {
            None | Some("sqlite") => StoreBackend::Sqlite,
            Some("memory") => StoreBackend::Memory,
            Some(other) => return Err(ConfigError::InvalidStore(other.to_string())),
        };

        if !allow_remote && !bind.ip().is_loopback() {
            return Err(ConfigError::RemoteBindNotAllowed(bind));
        }

        // Remote access always requires a token.
        if allow_remote && auth_token.is_none() {
            return Err(ConfigError::RemoteWithoutToken);
        }

        Ok(Self {
            home,
            bind,
            allow_remote,
            auth_token,
            history_capacity,
            session_idle,
            store,
        })
    }
}
