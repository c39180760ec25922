//! Credential exchange against the catalog authority
//!
//! POSTs `{"username", "password"}` as JSON to `{base}/auth`. A 200 carries
//! `{"bearer", "timeout"}`; anything else carries `{"error"}`.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::credentials::Credential;
use crate::error::{Error, Result};

/// Successful response from the authority endpoint.
///
/// `timeout` is a delta in seconds from the response time. The cache turns it
/// into an absolute expiry instant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token. The authority sends either a string or an integer.
    #[serde(deserialize_with = "bearer_as_string")]
    pub bearer: String,
    /// Seconds until the token expires
    pub timeout: u64,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn bearer_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "bearer must be a string or integer, got {other}"
        ))),
    }
}

/// Pull the `error` field out of a rejection body, falling back to the raw text.
pub(crate) fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("authority returned {status}"),
    }
}

/// Exchange the username/password pair for a bearer token.
pub async fn exchange_credentials(
    client: &reqwest::Client,
    credential: &Credential,
) -> Result<TokenResponse> {
    let endpoint = credential.auth_endpoint();
    debug!(endpoint = %endpoint, username = credential.username(), "requesting bearer token");

    let response = client
        .post(&endpoint)
        .json(&LoginRequest {
            username: credential.username(),
            password: credential.password().expose(),
        })
        .send()
        .await
        .map_err(|e| Error::Http(format!("credential exchange request failed: {e}")))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Auth(error_message(&body, status)));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::Auth(format!("invalid token response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_accepts_integer_bearer() {
        let json = r#"{"bearer":1234,"timeout":10}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.bearer, "1234");
        assert_eq!(token.timeout, 10);
    }

    #[test]
    fn token_response_accepts_string_bearer() {
        let json = r#"{"bearer":"abc.def","timeout":3600}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.bearer, "abc.def");
        assert_eq!(token.timeout, 3600);
    }

    #[test]
    fn token_response_rejects_object_bearer() {
        let json = r#"{"bearer":{"nested":true},"timeout":10}"#;
        assert!(serde_json::from_str::<TokenResponse>(json).is_err());
    }

    #[test]
    fn error_message_prefers_error_field() {
        let msg = error_message(
            r#"{"error":"invalid token"}"#,
            reqwest::StatusCode::UNAUTHORIZED,
        );
        assert_eq!(msg, "invalid token");
    }

    #[test]
    fn error_message_falls_back_to_body_then_status() {
        assert_eq!(
            error_message("gateway down", reqwest::StatusCode::BAD_GATEWAY),
            "gateway down"
        );
        assert_eq!(
            error_message("", reqwest::StatusCode::BAD_GATEWAY),
            "authority returned 502 Bad Gateway"
        );
    }

    #[tokio::test]
    async fn exchange_against_unreachable_authority_is_http_error() {
        let cred = Credential::new("alice", "pw".to_string(), "http://127.0.0.1:1").unwrap();
        let err = exchange_credentials(&reqwest::Client::new(), &cred)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got: {err:?}");
    }
}
