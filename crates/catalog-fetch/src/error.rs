//! Error types for discovery and fetching

use std::time::Duration;

/// Per-key failure reasons. None of these abort other keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Token exchange failed or the catalog refused the token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Not even page 1 returned records.
    #[error("no pages found: {0}")]
    Discovery(String),

    /// One page of the filtered fetch failed; logged and skipped.
    #[error("page {page} fetch failed: {detail}")]
    Task { page: u32, detail: String },

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl From<catalog_auth::Error> for Error {
    fn from(e: catalog_auth::Error) -> Self {
        match e {
            catalog_auth::Error::Auth(msg) | catalog_auth::Error::Validation(msg) => {
                Error::Auth(msg)
            }
            catalog_auth::Error::Http(msg) => Error::Auth(format!("authority unreachable: {msg}")),
        }
    }
}

/// Result alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;
