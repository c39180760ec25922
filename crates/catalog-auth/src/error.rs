//! Error types for catalog authentication

/// Errors from credential validation and token exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed credentials or base URL, raised before any network activity.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The authority endpoint rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
