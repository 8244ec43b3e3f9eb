// ABOUTME: Entry point for the lxnotes binary.
// ABOUTME: Parses CLI overrides, initializes tracing, opens the note store, and serves the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lxnotes_server::{AppState, LxNotesConfig, create_router, spawn_session_reaper};

/// Production notes server with per-session undo/redo history.
///
/// Flags override the matching LXNOTES_* environment variables.
#[derive(Debug, Parser)]
#[command(name = "lxnotes", version)]
struct Cli {
    /// Socket address to listen on (LXNOTES_BIND).
    #[arg(long)]
    bind: Option<String>,

    /// Data directory holding the note database (LXNOTES_HOME).
    #[arg(long)]
    home: Option<PathBuf>,

    /// Note store backend (LXNOTES_STORE).
    #[arg(long, value_parser = ["sqlite", "memory"])]
    store: Option<String>,

    /// Undo entries kept per session (LXNOTES_HISTORY_CAPACITY).
    #[arg(long)]
    history_capacity: Option<usize>,
}

impl Cli {
    fn lookup(&self, key: &str) -> Option<String> {
        let flag = match key {
            "LXNOTES_BIND" => self.bind.clone(),
            "LXNOTES_HOME" => self.home.as_ref().map(|h| h.display().to_string()),
            "LXNOTES_STORE" => self.store.clone(),
            "LXNOTES_HISTORY_CAPACITY" => self.history_capacity.map(|n| n.to_string()),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lxnotes=debug,tower_http=debug")),
        )
        .init();

    let config = LxNotesConfig::from_lookup(|key| cli.lookup(key)).context("invalid configuration")?;
    tracing::info!(
        bind = %config.bind,
        home = %config.home.display(),
        store = ?config.store,
        history_capacity = config.history_capacity,
        session_idle = ?config.session_idle,
        "lxnotes starting up"
    );

    let state = Arc::new(AppState::from_config(&config).context("failed to open note store")?);
    if spawn_session_reaper(Arc::clone(&state)).is_none() {
        tracing::info!("idle session expiry disabled");
    }
    let app = create_router(state, config.auth_token.clone());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("server error")?;

    Ok(())
}
