//! Validated login credentials for the catalog authority
//!
//! Validation runs once, in `Credential::new()`, before the cache ever talks
//! to the network. A `Credential` that exists is always well formed.

use common::Secret;
use url::Url;

use crate::constants::AUTH_PATH;
use crate::error::{Error, Result};

/// Username, password and API base URL. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Credential {
    username: String,
    password: Secret<String>,
    base_url: Url,
}

impl Credential {
    /// Validate and build a credential.
    ///
    /// Username and password must be non-blank; the base URL must be absolute
    /// with both a scheme and a host.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<Secret<String>>,
        base_url: &str,
    ) -> Result<Self> {
        let username = username.into();
        let password = password.into();

        if username.trim().is_empty() {
            return Err(Error::Validation(
                "username must be a non-empty string".into(),
            ));
        }
        if password.is_blank() {
            return Err(Error::Validation(
                "password must be a non-empty string".into(),
            ));
        }
        let base_url = parse_base_url(base_url).ok_or_else(|| {
            Error::Validation("URL must be valid and non-empty string".into())
        })?;

        Ok(Self {
            username,
            password,
            base_url,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &Secret<String> {
        &self.password
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of the credential exchange endpoint.
    pub fn auth_endpoint(&self) -> String {
        format!(
            "{}{AUTH_PATH}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

fn parse_base_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    (has_host && !url.scheme().is_empty()).then_some(url)
}
