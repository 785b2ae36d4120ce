// ABOUTME: Shared application state for the snippetbox HTTP server.
// ABOUTME: Holds the snippet and session stores plus the settings handlers and middleware need.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use snippetbox_store::{Database, SessionStore, SnippetStore};

use crate::config::SnippetboxConfig;

pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub snippets: SnippetStore,
    pub sessions: SessionStore,
    pub static_dir: PathBuf,
    pub session_lifetime: Duration,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create state over `db` with default session lifetime.
    pub fn new(db: Database, static_dir: PathBuf) -> Self {
        Self {
            snippets: SnippetStore::new(db.clone()),
            sessions: SessionStore::new(db),
            static_dir,
            session_lifetime: DEFAULT_SESSION_LIFETIME,
        }
    }

    pub fn from_config(db: Database, config: &SnippetboxConfig) -> Self {
        Self {
            session_lifetime: config.session_lifetime,
            ..Self::new(db, config.static_dir.clone())
        }
    }
}
