// ABOUTME: HTTP server for snippetbox: HTML pages for listing, viewing, and creating snippets.
// ABOUTME: Uses Axum with session-backed flash messages and Askama templates.

pub mod app_state;
pub mod config;
pub mod error;
pub mod headers;
pub mod routes;
pub mod session;
pub mod web;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, SnippetboxConfig};
pub use error::AppError;
pub use routes::create_router;
