//! Catalog API authentication library
//!
//! Exchanges a username/password pair for a short-lived bearer token and caches
//! it until expiry. The catalog transport asks the cache for a token before
//! every request; the cache only goes back to the authority endpoint when no
//! token is held or the held one has expired.
//!
//! Credential flow:
//! 1. `Credential::new()` validates username, password and base URL up front
//! 2. `TokenCache::get_token()` returns the cached token while it is valid
//! 3. On miss/expiry, `token::exchange_credentials()` POSTs to `{base}/auth`
//! 4. The transport calls `TokenCache::invalidate()` when the catalog rejects a token

pub mod cache;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod token;

pub use cache::{Token, TokenCache};
pub use constants::*;
pub use credentials::Credential;
pub use error::{Error, Result};
pub use token::{TokenResponse, exchange_credentials};
