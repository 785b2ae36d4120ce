// ABOUTME: Error type shared by the snippet and session stores.
// ABOUTME: Separates "no live row matched" from every other data-access fault.

use std::error::Error as StdError;

use thiserror::Error;

pub type BoxedError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No live row matched the lookup. Callers treat this as "not found".
    #[error("no matching record found")]
    NoRecord,

    /// Any other fault: connectivity, a malformed row, a timeout.
    #[error("store failure: {message}")]
    Failure {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },
}

impl StoreError {
    pub fn failure(message: impl Into<String>, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Failure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn failure_msg(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_no_record(&self) -> bool {
        matches!(self, Self::NoRecord)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::failure("sqlite error", err)
    }
}
