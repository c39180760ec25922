//! Movie catalog client
//!
//! Single-binary CLI that:
//! 1. Resolves credentials and settings (flags > env > TOML file > defaults)
//! 2. Authenticates against the catalog with a cached bearer token
//! 3. Discovers how many pages each requested year has
//! 4. Prints per-year counts, or matching titles when a search term is given

mod cli;
mod config;
mod report;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::HttpTransport;
use catalog_auth::{Credential, TokenCache};
use catalog_fetch::{FetchResult, Fetcher};
use clap::Parser;
use tracing::{Instrument, info, info_span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let run_id = uuid::Uuid::new_v4();
    let span = info_span!("run", run_id = %run_id.as_simple());

    run(cli).instrument(span).await
}

async fn run(cli: Cli) -> Result<()> {
    info!("starting movie-client");

    let config_path = Config::resolve_path(cli.config.as_deref());
    if let Some(path) = &config_path {
        info!(path = %path.display(), "loading configuration");
    }
    let config = Config::load(config_path.as_deref(), cli.overrides())
        .context("failed to load configuration")?;

    info!(
        base_url = %config.base_url,
        username = %config.username,
        concurrency = config.concurrency,
        years = cli.years.len(),
        "configuration loaded"
    );

    let results = execute(&config, cli.years.iter().copied(), cli.search_term()).await?;
    print!("{}", report::render(&results, !cli.count_only));
    Ok(())
}

/// Build the auth → transport → fetcher stack and run one fetch.
///
/// Fails only when the credentials or base URL are malformed; per-year
/// failures are carried in the returned map.
async fn execute(
    config: &Config,
    years: impl IntoIterator<Item = u32>,
    search: Option<&str>,
) -> Result<BTreeMap<u32, FetchResult>> {
    let credential = Credential::new(
        config.username.clone(),
        config.password.clone(),
        &config.base_url,
    )
    .context("invalid API credentials")?;

    let http_client = reqwest::Client::new();
    let tokens = Arc::new(TokenCache::new(credential, http_client.clone()));
    let transport = HttpTransport::new(http_client, &config.base_url, tokens)
        .with_resource(&config.resource)
        .with_timeout(config.timeout);

    let fetcher: Fetcher<u32> = Fetcher::new(Arc::new(transport), config.fetch_options());
    Ok(fetcher.fetch_all(years, search).await)
}
