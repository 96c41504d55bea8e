//! Hosted auth provider integration.
//!
//! The provider owns sessions and credentials; all we do is resolve a
//! bearer token to the provider's stable identity string and mirror
//! account-lifecycle webhooks into local [`Account`](crate::models::Account)
//! records. The session protocol itself stays opaque.

pub mod events;

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Transport-level failure talking to the provider.
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a body we could not decode.
    #[error("invalid identity provider response: {0}")]
    InvalidResponse(String),
}

/// Backend trait for resolving bearer tokens to external identities.
///
/// Implementations must be thread-safe (`Send + Sync`); they are called
/// concurrently from request handlers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token. `Ok(None)` means the token is invalid or
    /// expired; errors mean the provider itself was unreachable.
    async fn resolve(&self, token: &str) -> Result<Option<String>, IdentityError>;
}

#[derive(Deserialize)]
struct VerifyResponse {
    user_id: String,
}

/// Client for the provider's token verification endpoint.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    verify_url: String,
    api_key: SecretString,
}

impl HttpIdentityProvider {
    /// Create a client from auth configuration.
    #[must_use]
    pub fn new(config: &crate::config::AuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_url: config.verify_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip_all)]
    async fn resolve(&self, token: &str) -> Result<Option<String>, IdentityError> {
        let response = self
            .client
            .post(&self.verify_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::NOT_FOUND
        {
            return Ok(None);
        }

        let response = response.error_for_status()?;
        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        Ok(Some(verified.user_id))
    }
}

/// Fixed token-to-identity mapping for tests and demo deployments.
#[derive(Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, String>,
}

impl StaticIdentityProvider {
    /// Create a provider from token/identity pairs.
    pub fn new<I, T, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        let tokens = pairs
            .into_iter()
            .map(|(t, u)| (t.into(), u.into()))
            .collect();
        Self { tokens }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<String>, IdentityError> {
        Ok(self.tokens.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_resolves_known_tokens_only() {
        let provider = StaticIdentityProvider::new([("tok_1", "user_abc")]);
        assert_eq!(
            provider.resolve("tok_1").await.expect("resolve"),
            Some("user_abc".to_owned())
        );
        assert_eq!(provider.resolve("tok_2").await.expect("resolve"), None);
    }
}
