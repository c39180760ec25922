//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The password is loaded from MOVIE_API_PASSWORD or `password_file`, never
//! stored in the TOML directly to avoid leaking secrets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use catalog::DEFAULT_RESOURCE;
use catalog_auth::{BASE_URL_ENV, PASSWORD_ENV, USERNAME_ENV};
use catalog_fetch::{DiscoveryConfig, FetchOptions};
use common::Secret;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_CONFIG_FILE: &str = "movie-client.toml";

/// On-disk layout of the optional TOML file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    api: ApiSection,
    #[serde(default)]
    fetch: FetchSection,
}

#[derive(Debug, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
    username: Option<String>,
    /// Path to a file containing the password (alternative to MOVIE_API_PASSWORD)
    password_file: Option<PathBuf>,
    #[serde(default = "default_resource")]
    resource: String,
    #[serde(default = "default_timeout")]
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct FetchSection {
    #[serde(default = "default_concurrency")]
    concurrency: usize,
    #[serde(default = "default_initial_ceiling")]
    initial_ceiling: u32,
    deadline_secs: Option<u64>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            password_file: None,
            resource: default_resource(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            initial_ceiling: default_initial_ceiling(),
            deadline_secs: None,
        }
    }
}

fn default_resource() -> String {
    DEFAULT_RESOURCE.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    catalog_fetch::orchestrator::DEFAULT_CONCURRENCY
}

fn default_initial_ceiling() -> u32 {
    catalog_fetch::discovery::DEFAULT_INITIAL_CEILING
}

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub concurrency: Option<usize>,
    pub deadline_secs: Option<u64>,
}

/// Fully resolved runtime configuration
#[derive(Debug)]
pub struct Config {
    pub base_url: String,
    pub username: String,
    /// Empty when neither env var nor file supplied one; credential validation
    /// rejects it before any request.
    pub password: Secret<String>,
    pub resource: String,
    pub timeout: Duration,
    pub concurrency: usize,
    pub initial_ceiling: u32,
    pub deadline: Option<Duration>,
}

impl Config {
    /// Load the optional config file, then overlay env vars and CLI overrides.
    ///
    /// Password resolution order:
    /// 1. MOVIE_API_PASSWORD env var
    /// 2. password_file path from config
    pub fn load(path: Option<&Path>, overrides: Overrides) -> common::Result<Self> {
        let file: FileConfig = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => FileConfig::default(),
        };

        if file.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if file.fetch.initial_ceiling == 0 {
            return Err(common::Error::Config(
                "initial_ceiling must be greater than 0".into(),
            ));
        }
        let concurrency = overrides.concurrency.unwrap_or(file.fetch.concurrency);
        if concurrency == 0 {
            return Err(common::Error::Config(
                "concurrency must be greater than 0".into(),
            ));
        }

        let base_url = overrides
            .base_url
            .or_else(|| env_value(BASE_URL_ENV))
            .or(file.api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let username = overrides
            .username
            .or_else(|| env_value(USERNAME_ENV))
            .or(file.api.username)
            .unwrap_or_default();

        let password = if let Some(password) = env_value(PASSWORD_ENV) {
            password
        } else if let Some(ref password_file) = file.api.password_file {
            std::fs::read_to_string(password_file)
                .map_err(|e| {
                    common::Error::Config(format!(
                        "failed to read password_file {}: {e}",
                        password_file.display()
                    ))
                })?
                .trim()
                .to_owned()
        } else {
            String::new()
        };

        Ok(Self {
            base_url,
            username,
            password: Secret::new(password),
            resource: file.api.resource,
            timeout: Duration::from_secs(file.api.timeout_secs),
            concurrency,
            initial_ceiling: file.fetch.initial_ceiling,
            deadline: overrides
                .deadline_secs
                .or(file.fetch.deadline_secs)
                .map(Duration::from_secs),
        })
    }

    /// Resolve the config file from CLI arg, CONFIG_PATH env var, or the
    /// default file name if it exists in the working directory.
    pub fn resolve_path(cli_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(p.to_path_buf());
        }
        if let Some(p) = env_value("CONFIG_PATH") {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            concurrency: self.concurrency,
            discovery: DiscoveryConfig {
                initial_ceiling: self.initial_ceiling,
            },
            deadline: self.deadline,
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
