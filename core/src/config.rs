//! Client configuration.

use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_USER_AGENT: &str = concat!("monica-rs/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const BASE_URL_ENV: &str = "MONICA_BASE_URL";
pub const ACCESS_TOKEN_ENV: &str = "MONICA_ACCESS_TOKEN";
pub const USER_AGENT_ENV: &str = "MONICA_USER_AGENT";

/// Token wrapper that never reveals its contents in Debug/Display.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Settings for a `Client`.
///
/// `base_url` must include the `/api/` part and end with a slash, e.g.
/// `https://app.monicahq.com/api/`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub access_token: SecretString,
    /// Sent as `User-Agent`; an empty string omits the header.
    pub user_agent: String,
    /// Whole-request timeout of the default transport.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<SecretString>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a configuration from the environment.
    ///
    /// Expects:
    /// - `MONICA_BASE_URL`: API base URL (required)
    /// - `MONICA_ACCESS_TOKEN`: OAuth access token (required)
    /// - `MONICA_USER_AGENT`: overrides the default user agent (optional)
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = std::env::var(BASE_URL_ENV).map_err(|_| ApiError::MissingConfig(BASE_URL_ENV))?;
        let token = std::env::var(ACCESS_TOKEN_ENV).map_err(|_| ApiError::MissingConfig(ACCESS_TOKEN_ENV))?;

        let mut config = Self::new(base_url, token);
        if let Ok(user_agent) = std::env::var(USER_AGENT_ENV) {
            config.user_agent = user_agent;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("https://app.monicahq.com/api/", "token");
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.access_token.expose(), "token");
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let config = ClientConfig::new("https://app.monicahq.com/api/", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<secret>"));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::new("http://localhost/api/", "t")
            .with_user_agent("")
            .with_timeout(Duration::from_secs(5));
        assert!(config.user_agent.is_empty());
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn from_env_reads_all_variables() {
        temp_env::with_vars(
            [
                (BASE_URL_ENV, Some("http://localhost:3000/api/")),
                (ACCESS_TOKEN_ENV, Some("env-token")),
                (USER_AGENT_ENV, Some("crm-sync/2.0")),
            ],
            || {
                let config = ClientConfig::from_env().unwrap();
                assert_eq!(config.base_url, "http://localhost:3000/api/");
                assert_eq!(config.access_token.expose(), "env-token");
                assert_eq!(config.user_agent, "crm-sync/2.0");
            },
        );
    }

    #[test]
    fn from_env_requires_token() {
        temp_env::with_vars(
            [
                (BASE_URL_ENV, Some("http://localhost:3000/api/")),
                (ACCESS_TOKEN_ENV, None),
            ],
            || {
                let err = ClientConfig::from_env().unwrap_err();
                assert!(matches!(err, ApiError::MissingConfig(ACCESS_TOKEN_ENV)));
            },
        );
    }
}
