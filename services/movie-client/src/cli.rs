//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::config::Overrides;

/// Movie Client - fetch movie counts and titles from the catalog API
#[derive(Debug, Parser)]
#[command(name = "movie-client", version)]
pub struct Cli {
    /// The years to fetch movies for (e.g., -y 1940 1950)
    #[arg(short = 'y', long = "years", required = true, num_args = 1..)]
    pub years: Vec<u32>,

    /// Case-insensitive title filter (e.g., -s star); omit for counts only
    #[arg(short = 's', long = "search", default_value = "")]
    pub search: String,

    /// Display only the movie count for each year
    #[arg(short = 'c', long = "count-only")]
    pub count_only: bool,

    /// Path to a TOML config file (falls back to CONFIG_PATH)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Catalog API base URL (overrides MOVIE_API_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Catalog API username (overrides MOVIE_API_USERNAME)
    #[arg(long)]
    pub username: Option<String>,

    /// Concurrent page requests while filtering
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Abort keys still running after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

impl Cli {
    /// Flag values that take precedence over env vars and the config file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            concurrency: self.concurrency,
            deadline_secs: self.deadline_secs,
        }
    }

    /// Filter term, or `None` in count-only mode.
    pub fn search_term(&self) -> Option<&str> {
        Some(self.search.as_str()).filter(|s| !s.is_empty())
    }
}
