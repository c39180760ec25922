//! Catalog page transport
//!
//! Defines the `PageSource` seam that page discovery and the fetch orchestrator
//! talk to, plus `HttpTransport`, the authenticated reqwest implementation.
//! Each call fetches exactly one (key, page) pair and reports the outcome. The
//! only retry is a single re-authentication when the catalog refuses a cached
//! token. Callers decide whether a non-success result is a boundary,
//! an authentication failure or a terminal error.

pub mod http;

pub use http::{HttpTransport, classify_status};

use std::future::Future;
use std::pin::Pin;

/// Number of records in every page except the last.
pub const PAGE_SIZE: usize = 10;

/// Default resource segment in `{base}/{resource}/{key}/{page}`.
pub const DEFAULT_RESOURCE: &str = "movies";

/// Outcome of fetching one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    /// 200 with the page's record titles in source order
    Records(Vec<String>),
    /// 404; the API's normal end-of-data signal
    NotFound(String),
    /// 401/403; the catalog refused the bearer token
    AuthFailed(String),
    /// Any other status, undecodable body, or network failure (`status: None`)
    Failed { status: Option<u16>, detail: String },
}

impl PageResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PageResult::Records(_))
    }

    /// Error text carried by a non-success result.
    pub fn detail(&self) -> Option<&str> {
        match self {
            PageResult::Records(_) => None,
            PageResult::NotFound(d) | PageResult::AuthFailed(d) => Some(d),
            PageResult::Failed { detail, .. } => Some(detail),
        }
    }

    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PageResult::Records(_) => "ok",
            PageResult::NotFound(_) => "not_found",
            PageResult::AuthFailed(_) => "auth_failed",
            PageResult::Failed { .. } => "error",
        }
    }
}

/// Boxed future returned by `PageSource::fetch_page`.
///
/// `Err` is reserved for token acquisition failures; every HTTP outcome is a
/// `PageResult`.
pub type PageFuture<'a> =
    Pin<Box<dyn Future<Output = catalog_auth::Result<PageResult>> + Send + 'a>>;

/// Anything that can fetch one page of results for a partition key.
///
/// Uses `Pin<Box<dyn Future>>` return types so it can be shared as
/// `Arc<dyn PageSource<K>>` across fetch tasks.
pub trait PageSource<K>: Send + Sync {
    fn fetch_page<'a>(&'a self, key: &'a K, page: u32) -> PageFuture<'a>;
}
