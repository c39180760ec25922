//! Human-readable rendering of fetch results

use std::collections::BTreeMap;
use std::fmt::Display;

use catalog_fetch::FetchResult;

/// Render one line per key. Titles are listed only when `show_titles` is set
/// and the key was fetched with a filter.
pub fn render<K: Display>(results: &BTreeMap<K, FetchResult>, show_titles: bool) -> String {
    if results.is_empty() {
        return "No data to display.\n".to_string();
    }

    let mut out = String::from("\n========================================\n\n");
    out.push_str("Results for fetched movies:\n\n");
    for (key, result) in results {
        let line = match result {
            FetchResult::Failure(_) => format!("Failed to fetch movies for year {key}."),
            FetchResult::Success {
                total_count,
                matched: Some(titles),
            } if show_titles => format!(
                "Year {key} has {total_count} movies: {}",
                titles.join(", ")
            ),
            FetchResult::Success { total_count, .. } => {
                format!("Year {key} has {total_count} movies.")
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}
