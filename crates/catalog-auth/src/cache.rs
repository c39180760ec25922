//! Expiry-aware bearer token cache
//!
//! The cache holds at most one token. Reads take the `RwLock` briefly to clone
//! the current token; the credential exchange runs with no lock held, so two
//! callers racing on an expired token may both re-authenticate. Whichever
//! finishes last overwrites the slot with a complete `Token`.

use std::time::Duration;

use common::Secret;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::credentials::Credential;
use crate::error::Result;
use crate::token::exchange_credentials;

/// Longest lifetime honoured for a token. Larger `timeout` values are clamped.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A bearer token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct Token {
    value: Secret<String>,
    expires_at: Instant,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            value: Secret::new(value.into()),
            expires_at,
        }
    }

    /// Raw token string for the Authorization header.
    pub fn value(&self) -> &str {
        self.value.expose()
    }

    /// Valid only while expiry is strictly after `now`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        !self.value.is_blank() && self.expires_at > now
    }
}

/// Single-slot token cache shared by every fetch task.
pub struct TokenCache {
    credential: Credential,
    http_client: reqwest::Client,
    current: RwLock<Option<Token>>,
}

impl TokenCache {
    /// Create an empty cache. The first `get_token()` authenticates.
    pub fn new(credential: Credential, http_client: reqwest::Client) -> Self {
        Self {
            credential,
            http_client,
            current: RwLock::new(None),
        }
    }

    /// Return a token that is valid at the instant of return.
    ///
    /// Hits the authority endpoint only when no token is cached or the cached
    /// one has expired. A rejected exchange leaves the cache empty.
    #[instrument(skip_all, fields(username = self.credential.username()))]
    pub async fn get_token(&self) -> Result<Token> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        debug!("no valid cached token, authenticating");
        let response = match exchange_credentials(&self.http_client, &self.credential).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "credential exchange failed");
                self.current.write().await.take();
                return Err(e);
            }
        };

        let lifetime = Duration::from_secs(response.timeout).min(MAX_TOKEN_LIFETIME);
        let token = Token::new(response.bearer, Instant::now() + lifetime);
        *self.current.write().await = Some(token.clone());
        info!(
            timeout_secs = response.timeout,
            lifetime_secs = lifetime.as_secs(),
            "bearer token refreshed"
        );
        Ok(token)
    }

    /// Drop the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        if self.current.write().await.take().is_some() {
            debug!("cached bearer token invalidated");
        }
    }

    /// Cached token if it is still valid now.
    pub async fn cached(&self) -> Option<Token> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|t| t.is_valid_at(Instant::now()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use axum::Json;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    /// Start a mock authority that counts calls and answers with the given
    /// status and JSON body.
    async fn start_authority(
        status: StatusCode,
        body: serde_json::Value,
    ) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let app = axum::Router::new().route(
            "/auth",
            post(move |Json(login): Json<serde_json::Value>| {
                let counter = counter.clone();
                let body = body.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(login["username"], "alice");
                    assert_eq!(login["password"], "hunter2");
                    (status, Json(body)).into_response()
                }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (url, calls)
    }

    fn cache_for(url: &str) -> TokenCache {
        let cred = Credential::new("alice", "hunter2".to_string(), url).unwrap();
        TokenCache::new(cred, reqwest::Client::new())
    }

    #[test]
    fn token_validity_is_strict() {
        let now = Instant::now();
        assert!(Token::new("t", now + Duration::from_secs(1)).is_valid_at(now));
        assert!(!Token::new("t", now).is_valid_at(now));
        assert!(!Token::new("", now + Duration::from_secs(60)).is_valid_at(now));
    }

    #[tokio::test]
    async fn second_call_within_window_reuses_token() {
        let (url, calls) =
            start_authority(StatusCode::OK, serde_json::json!({"bearer": 1234, "timeout": 3600}))
                .await;
        let cache = cache_for(&url);

        let first = cache.get_token().await.unwrap();
        let second = cache.get_token().await.unwrap();

        assert_eq!(first.value(), "1234");
        assert_eq!(second.value(), "1234");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_token_triggers_exactly_one_refresh() {
        // timeout 0 means the token is already expired when the next call arrives
        let (url, calls) =
            start_authority(StatusCode::OK, serde_json::json!({"bearer": "abc", "timeout": 0}))
                .await;
        let cache = cache_for(&url);

        cache.get_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.get_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejected_credentials_surface_error_message_and_cache_nothing() {
        let (url, calls) = start_authority(
            StatusCode::UNAUTHORIZED,
            serde_json::json!({"error": "invalid token"}),
        )
        .await;
        let cache = cache_for(&url);

        let err = cache.get_token().await.unwrap_err();
        assert_eq!(err, Error::Auth("invalid token".into()));
        assert!(cache.cached().await.is_none());

        // Nothing cached, so the next call goes back to the authority
        let _ = cache.get_token().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_reauthentication() {
        let (url, calls) =
            start_authority(StatusCode::OK, serde_json::json!({"bearer": 1, "timeout": 3600}))
                .await;
        let cache = cache_for(&url);

        cache.get_token().await.unwrap();
        cache.invalidate().await;
        assert!(cache.cached().await.is_none());
        cache.get_token().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn oversized_timeout_is_clamped_not_fatal() {
        let (url, calls) = start_authority(
            StatusCode::OK,
            serde_json::json!({"bearer": "t", "timeout": u64::MAX}),
        )
        .await;
        let cache = cache_for(&url);

        let before = Instant::now();
        let token = cache.get_token().await.unwrap();
        assert_eq!(token.value(), "t");
        assert!(token.expires_at <= Instant::now() + MAX_TOKEN_LIFETIME);
        assert!(token.expires_at > before + Duration::from_secs(3600));

        cache.get_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_all_receive_valid_token() {
        let (url, calls) =
            start_authority(StatusCode::OK, serde_json::json!({"bearer": 7, "timeout": 3600}))
                .await;
        let cache = Arc::new(cache_for(&url));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get_token().await }));
        }
        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.value(), "7");
        }

        // Racing refreshes are allowed, but a settled cache stops calling out
        let settled = calls.load(Ordering::SeqCst);
        assert!((1..=8).contains(&settled), "calls: {settled}");
        cache.get_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), settled);
    }
}
