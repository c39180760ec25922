//! Per-key discovery plus bounded-concurrency fetch-and-filter
//!
//! Keys are processed one at a time and each ends in its own `FetchResult`,
//! so a failing key never hides or aborts another. Within a key the filtered
//! fetch keeps at most `concurrency` page requests in flight and folds matches
//! in completion order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use catalog::{PAGE_SIZE, PageResult, PageSource};
use futures_util::StreamExt;
use futures_util::stream;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::discovery::{DiscoveryConfig, discover};
use crate::error::{Error, Result};

/// Default number of in-flight page requests during the filtered fetch.
pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum concurrent page requests per key (values below 1 are raised to 1)
    pub concurrency: usize,
    pub discovery: DiscoveryConfig,
    /// Overall budget for one `fetch_all` call. Keys still running when it
    /// expires are recorded as `DeadlineExceeded`.
    pub deadline: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            discovery: DiscoveryConfig::default(),
            deadline: None,
        }
    }
}

/// Terminal state of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Failure(Error),
    /// `matched` is `None` in count-only mode.
    Success {
        total_count: usize,
        matched: Option<Vec<String>>,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    pub fn total_count(&self) -> Option<usize> {
        match self {
            FetchResult::Success { total_count, .. } => Some(*total_count),
            FetchResult::Failure(_) => None,
        }
    }

    pub fn matched(&self) -> Option<&[String]> {
        match self {
            FetchResult::Success {
                matched: Some(m), ..
            } => Some(m),
            _ => None,
        }
    }

    fn outcome_label(&self) -> &'static str {
        match self {
            FetchResult::Success { .. } => "success",
            FetchResult::Failure(Error::DeadlineExceeded(_)) => "deadline",
            FetchResult::Failure(_) => "failure",
        }
    }
}

/// Runs discovery and the optional filtered fetch for a set of keys.
pub struct Fetcher<K> {
    source: Arc<dyn PageSource<K>>,
    options: FetchOptions,
}

impl<K> Fetcher<K>
where
    K: Ord + Clone + Display + Send + Sync,
{
    pub fn new(source: Arc<dyn PageSource<K>>, mut options: FetchOptions) -> Self {
        options.concurrency = options.concurrency.max(1);
        Self { source, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch every distinct key, returning one result per key in ascending order.
    ///
    /// An empty or absent `filter` means count-only mode. Holds no state
    /// between calls.
    pub async fn fetch_all<I>(&self, keys: I, filter: Option<&str>) -> BTreeMap<K, FetchResult>
    where
        I: IntoIterator<Item = K>,
    {
        let keys: BTreeSet<K> = keys.into_iter().collect();
        let filter = filter.filter(|term| !term.is_empty());
        let deadline = self
            .options
            .deadline
            .map(|budget| (budget, Instant::now() + budget));
        info!(keys = keys.len(), filtered = filter.is_some(), "fetching catalog");

        let mut results = BTreeMap::new();
        for key in keys {
            let work = self.fetch_key(&key, filter);
            let result = match deadline {
                Some((budget, at)) => match tokio::time::timeout_at(at, work).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(key = %key, "deadline exceeded, abandoning key");
                        FetchResult::Failure(Error::DeadlineExceeded(budget))
                    }
                },
                None => work.await,
            };
            crate::metrics::record_key(result.outcome_label());
            results.insert(key, result);
        }
        results
    }

    #[instrument(skip(self, key), fields(key = %key))]
    async fn fetch_key(&self, key: &K, filter: Option<&str>) -> FetchResult {
        let discovery = match discover(self.source.as_ref(), key, &self.options.discovery).await {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "discovery failed");
                return FetchResult::Failure(e);
            }
        };

        match filter {
            None => {
                let full_pages = discovery.last_page as usize - 1;
                let total_count = PAGE_SIZE * full_pages + discovery.last_page_records.len();
                info!(total_count, last_page = discovery.last_page, "counted records");
                FetchResult::Success {
                    total_count,
                    matched: None,
                }
            }
            Some(term) => {
                let matched = self.filter_pages(key, discovery.last_page, term).await;
                info!(matched = matched.len(), last_page = discovery.last_page, "filtered records");
                FetchResult::Success {
                    total_count: matched.len(),
                    matched: Some(matched),
                }
            }
        }
    }

    /// Fetch pages `1..=last_page` with bounded concurrency and keep titles
    /// containing `term`, ignoring case. Failed pages are logged and skipped.
    async fn filter_pages(&self, key: &K, last_page: u32, term: &str) -> Vec<String> {
        let needle = term.to_lowercase();
        let needle = needle.as_str();
        let source = self.source.as_ref();

        stream::iter(1..=last_page)
            .map(|page| async move { (page, page_matches(source, key, page, needle).await) })
            .buffer_unordered(self.options.concurrency)
            .fold(Vec::new(), |mut matched, (page, outcome)| async move {
                match outcome {
                    Ok(titles) => matched.extend(titles),
                    Err(e) => {
                        warn!(page, error = %e, "page dropped from filtered results");
                        crate::metrics::record_task_failure();
                    }
                }
                matched
            })
            .await
    }
}

/// Fetch one page and return its matching titles in source order.
async fn page_matches<K>(
    source: &dyn PageSource<K>,
    key: &K,
    page: u32,
    needle: &str,
) -> Result<Vec<String>> {
    let result = source
        .fetch_page(key, page)
        .await
        .map_err(|e| Error::Task {
            page,
            detail: e.to_string(),
        })?;
    crate::metrics::record_page_request("filter", result.label());

    match result {
        PageResult::Records(records) => {
            let matched: Vec<String> = records
                .into_iter()
                .filter(|title| title.to_lowercase().contains(needle))
                .collect();
            debug!(page, matched = matched.len(), "filtered page");
            Ok(matched)
        }
        other => Err(Error::Task {
            page,
            detail: other.detail().unwrap_or_default().to_string(),
        }),
    }
}
