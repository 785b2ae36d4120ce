// ABOUTME: Entry point for the snippetbox binary.
// ABOUTME: Parses CLI arguments, initializes tracing, opens the database, and starts the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use snippetbox_server::{AppState, SnippetboxConfig, create_router};
use snippetbox_store::{Database, SessionStore};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Share short text snippets that expire.
#[derive(Debug, Parser)]
#[command(name = "snippetbox", version, about)]
struct Cli {
    /// HTTP network address, e.g. 127.0.0.1:4400 or :4400 (overrides SNIPPETBOX_ADDR)
    #[arg(long)]
    addr: Option<String>,

    /// SQLite database path, or :memory: (overrides SNIPPETBOX_DB)
    #[arg(long)]
    dsn: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal; real environment variables still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "snippetbox=debug,snippetbox_server=debug,snippetbox_store=debug,tower_http=debug",
                )
            }),
        )
        .init();

    let cli = Cli::parse();

    let mut config = SnippetboxConfig::from_env().context("invalid configuration")?;
    if let Some(addr) = cli.addr.as_deref() {
        config = config.with_addr(addr).context("invalid --addr")?;
    }
    if let Some(dsn) = cli.dsn {
        config.db_path = dsn;
    }

    let db = Database::open(&config.db_path, config.query_timeout)
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    spawn_session_cleanup(SessionStore::new(db.clone()));

    let state = Arc::new(AppState::from_config(db, &config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!(addr = %config.addr, db = %config.db_path.display(), "snippetbox listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Periodically purge expired sessions so the table does not grow without bound.
fn spawn_session_cleanup(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.delete_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "purged expired sessions"),
                Err(e) => tracing::warn!(error = ?e, "session cleanup failed"),
            }
        }
    });
}
