//! Fetch counters
//!
//! - `catalog_page_requests_total` (counter): labels `phase`, `outcome`
//! - `catalog_keys_total` (counter): label `outcome`
//! - `catalog_filter_task_failures_total` (counter)
//!
//! Without an installed recorder these are no-ops.

/// Record one page request. `phase` is `discovery` or `filter`.
pub fn record_page_request(phase: &'static str, outcome: &'static str) {
    metrics::counter!("catalog_page_requests_total", "phase" => phase, "outcome" => outcome)
        .increment(1);
}

/// Record a key reaching its terminal state.
pub fn record_key(outcome: &'static str) {
    metrics::counter!("catalog_keys_total", "outcome" => outcome).increment(1);
}

/// Record a filtered-fetch page that was dropped from the aggregate.
pub fn record_task_failure() {
    metrics::counter!("catalog_filter_task_failures_total").increment(1);
}
