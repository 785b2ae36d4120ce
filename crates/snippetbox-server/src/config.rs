// ABOUTME: Configuration loading and validation for the snippetbox server.
// ABOUTME: Reads SNIPPETBOX_* environment variables and rejects malformed values at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Session expiry is stored with a four-digit year, so keep lifetimes well inside that.
const MAX_SESSION_LIFETIME_HOURS: u64 = 24 * 365 * 100;
/// SQLite's busy timeout is held in an `i32` of milliseconds.
const MAX_QUERY_TIMEOUT_SECS: u64 = 60 * 60;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },

    #[error("{var} must be a whole number from 1 to {max}, got {value:?}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        max: u64,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct SnippetboxConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    pub session_lifetime: Duration,
    pub query_timeout: Duration,
}

impl SnippetboxConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - SNIPPETBOX_ADDR: socket address to bind (default: 127.0.0.1:4400)
    /// - SNIPPETBOX_DB: SQLite database path, or `:memory:` (default: snippetbox.db)
    /// - SNIPPETBOX_STATIC_DIR: directory served under /static (default: ./ui/static)
    /// - SNIPPETBOX_SESSION_LIFETIME_HOURS: session cookie lifetime (default: 12)
    /// - SNIPPETBOX_QUERY_TIMEOUT_SECS: per-call database timeout (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let addr = parse_addr("SNIPPETBOX_ADDR", get("SNIPPETBOX_ADDR"))?;

        let db_path = get("SNIPPETBOX_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("snippetbox.db"));

        let static_dir = get("SNIPPETBOX_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./ui/static"));

        let lifetime_hours = parse_bounded(
            "SNIPPETBOX_SESSION_LIFETIME_HOURS",
            get("SNIPPETBOX_SESSION_LIFETIME_HOURS"),
            12,
            MAX_SESSION_LIFETIME_HOURS,
        )?;

        let timeout_secs = parse_bounded(
            "SNIPPETBOX_QUERY_TIMEOUT_SECS",
            get("SNIPPETBOX_QUERY_TIMEOUT_SECS"),
            5,
            MAX_QUERY_TIMEOUT_SECS,
        )?;

        Ok(Self {
            addr,
            db_path,
            static_dir,
            session_lifetime: Duration::from_secs(lifetime_hours.saturating_mul(60 * 60)),
            query_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Override the bind address, e.g. from a command-line flag.
    pub fn with_addr(mut self, addr: &str) -> Result<Self, ConfigError> {
        self.addr = parse_addr("--addr", Some(addr.to_string()))?;
        Ok(self)
    }
}

fn parse_addr(var: &'static str, value: Option<String>) -> Result<SocketAddr, ConfigError> {
    let value = value.unwrap_or_else(|| "127.0.0.1:4400".to_string());
    // Accept the ":4400" shorthand for "all interfaces".
    let normalized = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.clone()
    };
    normalized
        .parse()
        .map_err(|_| ConfigError::InvalidAddr { var, value })
}

fn parse_bounded(
    var: &'static str,
    value: Option<String>,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => match v.trim().parse::<u64>() {
            Ok(n) if (1..=max).contains(&n) => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value: v, max }),
        },
    }
}
