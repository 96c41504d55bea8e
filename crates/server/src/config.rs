//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHALKBOX_DATABASE_URL` - `PostgreSQL` connection string
//! - `GATEWAY_BASE_URL` - Payment gateway API base URL
//! - `GATEWAY_KEY_ID` - Payment gateway key id
//! - `GATEWAY_KEY_SECRET` - Payment gateway key secret
//! - `GATEWAY_WEBHOOK_SECRET` - Secret for settlement webhook signatures
//! - `AUTH_VERIFY_URL` - Auth provider token verification endpoint
//! - `AUTH_API_KEY` - Auth provider API key
//! - `AUTH_WEBHOOK_SECRET` - Secret for lifecycle webhook signatures
//!
//! ## Optional
//! - `CHALKBOX_HOST` - Bind address (default: 127.0.0.1)
//! - `CHALKBOX_PORT` - Bind port (default: 3000)
//! - `SENTRY_DSN` - Error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Deployment environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Minimum length for webhook and API secrets.
const MIN_SECRET_LENGTH: usize = 16;

/// Placeholder fragments that indicate an unconfigured secret.
const PLACEHOLDER_FRAGMENTS: &[&str] = &["changeme", "your-", "example", "placeholder"];

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway API base URL.
    pub base_url: String,
    /// Key id for basic auth.
    pub key_id: String,
    /// Key secret for basic auth.
    pub key_secret: SecretString,
    /// Secret the gateway signs settlement webhooks with.
    pub webhook_secret: SecretString,
}

/// Auth provider configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token verification endpoint.
    pub verify_url: String,
    /// API key for server-to-server calls.
    pub api_key: SecretString,
    /// Secret the provider signs lifecycle webhooks with.
    pub webhook_secret: SecretString,
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct ChalkboxConfig {
    /// `PostgreSQL` connection string.
    pub database_url: SecretString,
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Payment gateway settings.
    pub gateway: GatewayConfig,
    /// Auth provider settings.
    pub auth: AuthConfig,
    /// Sentry DSN, if error tracking is enabled.
    pub sentry_dsn: Option<String>,
    /// Sentry environment name.
    pub sentry_environment: Option<String>,
}

impl ChalkboxConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder/length check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CHALKBOX_DATABASE_URL")?;
        let host = get_env_or_default("CHALKBOX_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHALKBOX_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("CHALKBOX_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHALKBOX_PORT".to_owned(), e.to_string()))?;

        let gateway = GatewayConfig::from_env()?;
        let auth = AuthConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            gateway,
            auth,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GatewayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("GATEWAY_BASE_URL")?,
            key_id: get_required_env("GATEWAY_KEY_ID")?,
            key_secret: get_validated_secret("GATEWAY_KEY_SECRET")?,
            webhook_secret: get_validated_secret("GATEWAY_WEBHOOK_SECRET")?,
        })
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            verify_url: get_required_env("AUTH_VERIFY_URL")?,
            api_key: get_validated_secret("AUTH_API_KEY")?,
            webhook_secret: get_validated_secret("AUTH_WEBHOOK_SECRET")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a required secret and reject obvious placeholders and short values.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret(key, value)
}

fn validate_secret(key: &str, value: String) -> Result<SecretString, ConfigError> {
    if value.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            format!("must be at least {MIN_SECRET_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    if PLACEHOLDER_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            "looks like a placeholder value".to_owned(),
        ));
    }

    Ok(SecretString::from(value))
}

/// A configuration suitable for tests: loopback bind, offline collaborators.
#[must_use]
pub fn test_config() -> ChalkboxConfig {
    ChalkboxConfig {
        database_url: SecretString::from("postgres://localhost/chalkbox_test"),
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        gateway: GatewayConfig {
            base_url: "http://localhost:0".to_owned(),
            key_id: "key_test".to_owned(),
            key_secret: SecretString::from("sk_test_0123456789abcdef"),
            webhook_secret: SecretString::from("whsec_gw_0123456789abcdef"),
        },
        auth: AuthConfig {
            verify_url: "http://localhost:0/verify".to_owned(),
            api_key: SecretString::from("ak_test_0123456789abcdef"),
            webhook_secret: SecretString::from("whsec_auth_0123456789abcdef"),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // from_env reads the process environment, which tests must not mutate;
    // the validation rules are exercised directly instead.
    #[test]
    fn secret_validation_rejects_short_and_placeholder_values() {
        assert!(matches!(
            validate_secret("k", "short".to_owned()),
            Err(ConfigError::InsecureSecret(..))
        ));
        assert!(matches!(
            validate_secret("k", "your-secret-key-here".to_owned()),
            Err(ConfigError::InsecureSecret(..))
        ));
        assert!(validate_secret("k", "sk_live_0123456789abcdef".to_owned()).is_ok());
    }

    #[test]
    fn test_config_is_self_consistent() {
        let config = test_config();
        assert_eq!(config.socket_addr().port(), 0);
    }
}
