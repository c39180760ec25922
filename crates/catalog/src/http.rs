//! Authenticated HTTP transport for catalog pages

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use catalog_auth::TokenCache;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{DEFAULT_RESOURCE, PageFuture, PageResult, PageSource};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Issues `GET {base}/{resource}/{key}/{page}` with a bearer token from the
/// shared `TokenCache`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    resource: String,
    timeout: Duration,
    tokens: Arc<TokenCache>,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, base_url: &str, tokens: Arc<TokenCache>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            resource: DEFAULT_RESOURCE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            tokens,
        }
    }

    /// Override the resource path segment (default `movies`).
    pub fn with_resource(mut self, resource: &str) -> Self {
        self.resource = resource.trim_matches('/').to_string();
        self
    }

    /// Per-request timeout. Expiry is reported as a `Failed` page.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn page_url(&self, key: &impl Display, page: u32) -> String {
        format!("{}/{}/{key}/{page}", self.base_url, self.resource)
    }

    /// Fetch one page, retrying once with a fresh token if the catalog
    /// refuses the cached one.
    #[instrument(skip(self, key), fields(key = %key))]
    async fn get_page<K: Display + Sync>(
        &self,
        key: &K,
        page: u32,
    ) -> catalog_auth::Result<PageResult> {
        let url = self.page_url(key, page);

        let token = self.tokens.get_token().await?;
        let result = self.request(&url, token.value()).await;
        if !matches!(result, PageResult::AuthFailed(_)) {
            return Ok(result);
        }

        debug!("catalog refused bearer token, re-authenticating");
        self.tokens.invalidate().await;
        let token = self.tokens.get_token().await?;
        let result = self.request(&url, token.value()).await;
        if matches!(result, PageResult::AuthFailed(_)) {
            warn!("catalog refused fresh bearer token");
            self.tokens.invalidate().await;
        }
        Ok(result)
    }

    async fn request(&self, url: &str, bearer: &str) -> PageResult {
        let response = match self
            .client
            .get(url)
            .bearer_auth(bearer)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "page request failed");
                return PageResult::Failed {
                    status: None,
                    detail: format!("request to {url} failed: {e}"),
                };
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            return match response.json::<Vec<String>>().await {
                Ok(records) => {
                    debug!(records = records.len(), "page fetched");
                    PageResult::Records(records)
                }
                Err(e) => PageResult::Failed {
                    status: Some(status.as_u16()),
                    detail: format!("invalid page body: {e}"),
                },
            };
        }

        let body = response.text().await.unwrap_or_default();
        let result = classify_status(status.as_u16(), &body);
        debug!(status = status.as_u16(), outcome = result.label(), "page not available");
        result
    }
}

impl<K: Display + Sync> PageSource<K> for HttpTransport {
    fn fetch_page<'a>(&'a self, key: &'a K, page: u32) -> PageFuture<'a> {
        Box::pin(self.get_page(key, page))
    }
}

/// Classify a non-200 catalog response.
///
/// 404 is the end-of-data signal, 401/403 mean the token was refused, and
/// everything else is a generic failure. The detail is the body's `error`
/// field when present.
pub fn classify_status(status: u16, body: &str) -> PageResult {
    let detail = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("catalog returned status {status}"),
    };
    match status {
        404 => PageResult::NotFound(detail),
        401 | 403 => PageResult::AuthFailed(detail),
        _ => PageResult::Failed {
            status: Some(status),
            detail,
        },
    }
}
