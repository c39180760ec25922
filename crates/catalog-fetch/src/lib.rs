//! Page discovery and concurrent fetch-and-filter for the movie catalog
//!
//! The catalog has no count endpoint, so the number of pages for a key is
//! found by probing: page existence is monotonic in the page index, which lets
//! an exponential probe bracket the boundary and a binary search pin it down.
//! The orchestrator then either sizes the result from the last page (count
//! only) or fetches every page with bounded concurrency and filters titles.
//!
//! Key lifecycle:
//! 1. `Fetcher::fetch_all()` deduplicates and sorts the requested keys
//! 2. `discovery::discover()` finds the last page that returns records
//! 3. No filter: total = `PAGE_SIZE * (last - 1) + len(last page)`
//! 4. Filter: pages `1..=last` are fetched `concurrency` at a time and matched
//! 5. Every key ends as `FetchResult::Success` or `FetchResult::Failure`

pub mod discovery;
pub mod error;
pub mod metrics;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use discovery::{Discovery, DiscoveryConfig, discover};
pub use error::{Error, Result};
pub use orchestrator::{FetchOptions, FetchResult, Fetcher};
