//! Last-page discovery by exponential probe plus binary search
//!
//! Only the 200 vs non-200 outcome of each page matters; record counts are
//! never used to decide the boundary. Any non-success other than an auth
//! failure (404, 5xx, network error) counts as "past the end".
//!
//! Every request depends on the previous answer, so discovery for one key is
//! strictly sequential.

use std::fmt::Display;

use catalog::{PageResult, PageSource};
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};

/// Default first probe and initial upper bound.
pub const DEFAULT_INITIAL_CEILING: u32 = 100;

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// First page probed; doubled while pages keep returning records.
    pub initial_ceiling: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            initial_ceiling: DEFAULT_INITIAL_CEILING,
        }
    }
}

/// Outcome of a successful discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Highest page that returned records. Always ≥ 1.
    pub last_page: u32,
    /// Records of `last_page`, kept from the probe that fetched it.
    pub last_page_records: Vec<String>,
    /// Page requests issued.
    pub requests: u32,
}

struct Search<'a, K> {
    source: &'a dyn PageSource<K>,
    key: &'a K,
    requests: u32,
    last_hit: Option<(u32, Vec<String>)>,
    last_miss: Option<String>,
}

impl<K: Display> Search<'_, K> {
    /// Fetch one page. Auth problems abort the search instead of counting as
    /// a boundary.
    async fn probe(&mut self, page: u32) -> Result<bool> {
        self.requests += 1;
        let result = self.source.fetch_page(self.key, page).await?;
        crate::metrics::record_page_request("discovery", result.label());
        debug!(page, outcome = result.label(), "probed page");

        match result {
            PageResult::Records(records) => {
                self.last_hit = Some((page, records));
                Ok(true)
            }
            PageResult::AuthFailed(detail) => Err(Error::Auth(detail)),
            PageResult::NotFound(detail) | PageResult::Failed { detail, .. } => {
                self.last_miss = Some(detail);
                Ok(false)
            }
        }
    }
}

/// Find the last page of `key` that returns records.
///
/// Fails with `Error::Discovery` (carrying the page-1 error text) when page 1
/// itself does not return records, and with `Error::Auth` as soon as token
/// acquisition fails or the catalog rejects the token.
#[instrument(skip_all, fields(key = %key))]
pub async fn discover<K: Display>(
    source: &dyn PageSource<K>,
    key: &K,
    config: &DiscoveryConfig,
) -> Result<Discovery> {
    let mut search = Search {
        source,
        key,
        requests: 0,
        last_hit: None,
        last_miss: None,
    };

    let mut lower = 1u32;
    let mut upper = config.initial_ceiling.max(1);
    let mut probe = upper;

    // Exponential phase: double until the first page without records
    while search.probe(probe).await? {
        let next = probe.checked_mul(2).ok_or_else(|| {
            Error::Discovery(format!("page {probe} still has records, page range exhausted"))
        })?;
        lower = probe + 1;
        upper = next;
        probe = next;
    }

    // Binary phase: pages below `lower` are known hits, pages above `upper` misses
    while lower <= upper {
        let mid = lower + (upper - lower) / 2;
        if search.probe(mid).await? {
            lower = mid + 1;
        } else {
            upper = mid - 1;
        }
    }

    // `last_hit` is always the page that last raised `lower`, i.e. `lower - 1`
    match search.last_hit {
        Some((last_page, last_page_records)) => {
            info!(last_page, requests = search.requests, "discovered last page");
            Ok(Discovery {
                last_page,
                last_page_records,
                requests: search.requests,
            })
        }
        None => Err(Error::Discovery(
            search
                .last_miss
                .unwrap_or_else(|| format!("page 1 of {key} returned no records")),
        )),
    }
}
