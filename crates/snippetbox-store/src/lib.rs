// ABOUTME: Persistence layer for snippetbox over a single SQLite database.
// ABOUTME: Provides the snippet store, the session store, and the shared database handle.

pub mod db;
pub mod error;
pub mod sessions;
pub mod snippets;

pub use db::Database;
pub use error::StoreError;
pub use sessions::{SessionData, SessionStore};
pub use snippets::SnippetStore;
