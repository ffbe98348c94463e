//! Client configuration.
//!
//! [`Settings`] is the raw, serde-friendly record that a host application
//! fills from a file or the environment. [`ClientConfig`] is the validated,
//! immutable value the client is built from.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Default service origin.
pub const DEFAULT_BASE_URL: &str = "https://sharpapi.com/api/v1";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "SharpAPILaravelInvoiceParser/1.0.0";

/// Default seconds between status polls.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 5;

/// Default maximum seconds to wait for a job.
pub const DEFAULT_POLLING_WAIT_SECS: u64 = 180;

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Raw configuration options as supplied by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API credential. Required.
    pub api_key: Option<String>,

    /// Service origin.
    pub base_url: String,

    /// Seconds between status polls.
    pub api_job_status_polling_interval: u64,

    /// Maximum total seconds to wait. `0` fails after the first unfinished poll.
    pub api_job_status_polling_wait: u64,

    /// Wait for the job forever, ignoring `api_job_status_polling_wait`.
    pub api_job_status_polling_unbounded: bool,

    /// Use the service's `Retry-After` header instead of the fixed interval.
    pub respect_retry_after: bool,

    /// Per-request timeout in seconds.
    pub request_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_job_status_polling_interval: DEFAULT_POLLING_INTERVAL_SECS,
            api_job_status_polling_wait: DEFAULT_POLLING_WAIT_SECS,
            api_job_status_polling_unbounded: false,
            respect_retry_after: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn from_file(path: &Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

/// Upper bound on the total time spent polling one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxWait {
    /// Give up once this much time has elapsed. `Duration::ZERO` means no
    /// patience: the first unfinished poll times out.
    Limited(Duration),
    /// Poll until the job reaches a terminal state or the caller cancels.
    Unbounded,
}

impl MaxWait {
    /// Whether a job that has been polling for `elapsed` has run out of time.
    pub fn is_exceeded(&self, elapsed: Duration) -> bool {
        match self {
            MaxWait::Limited(limit) => limit.is_zero() || elapsed > *limit,
            MaxWait::Unbounded => false,
        }
    }
}

/// Validated client configuration. Immutable once built.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    polling_interval: Duration,
    max_wait: MaxWait,
    user_agent: String,
    request_timeout: Duration,
    respect_retry_after: bool,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("polling_interval", &self.polling_interval)
            .field("max_wait", &self.max_wait)
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("respect_retry_after", &self.respect_retry_after)
            .finish()
    }
}

impl ClientConfig {
    /// Start building a configuration around an API key.
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(api_key)
    }

    /// Build a configuration from raw settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder = ClientConfigBuilder::new(settings.api_key.clone().unwrap_or_default())
            .base_url(&settings.base_url)
            .polling_interval(Duration::from_secs(settings.api_job_status_polling_interval))
            .request_timeout(Duration::from_secs(settings.request_timeout))
            .respect_retry_after(settings.respect_retry_after);

        builder = if settings.api_job_status_polling_unbounded {
            builder.max_wait(MaxWait::Unbounded)
        } else {
            builder.max_wait(MaxWait::Limited(Duration::from_secs(
                settings.api_job_status_polling_wait,
            )))
        };

        builder.build()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    pub fn max_wait(&self) -> MaxWait {
        self.max_wait
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn respect_retry_after(&self) -> bool {
        self.respect_retry_after
    }

    /// Join an endpoint path onto the base URL with exactly one separator.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    api_key: String,
    base_url: String,
    polling_interval: Duration,
    max_wait: MaxWait,
    user_agent: String,
    request_timeout: Duration,
    respect_retry_after: bool,
}

impl ClientConfigBuilder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            polling_interval: Duration::from_secs(DEFAULT_POLLING_INTERVAL_SECS),
            max_wait: MaxWait::Limited(Duration::from_secs(DEFAULT_POLLING_WAIT_SECS)),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            respect_retry_after: false,
        }
    }

    /// Override the service origin.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the delay between status polls.
    pub fn polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Set the maximum total wait.
    pub fn max_wait(mut self, max_wait: MaxWait) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Override the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Honour the service's `Retry-After` header between polls.
    pub fn respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = respect;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        let api_key = self.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(ClientError::Config("API key is required".to_string()));
        }

        let base_url = self.base_url.trim().to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                base_url
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ClientError::Config("user agent must not be empty".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(ClientConfig {
            api_key,
            base_url,
            polling_interval: self.polling_interval,
            max_wait: self.max_wait,
            user_agent: self.user_agent,
            request_timeout: self.request_timeout,
            respect_retry_after: self.respect_retry_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_api_key_is_rejected() {
        for key in ["", "   "] {
            let err = ClientConfig::builder(key).build().unwrap_err();
            assert!(matches!(err, ClientError::Config(_)));
        }
    }

    #[test]
    fn test_missing_api_key_in_settings_is_rejected() {
        let err = ClientConfig::from_settings(&Settings::default()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder("key").build().unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.polling_interval(), Duration::from_secs(5));
        assert_eq!(config.max_wait(), MaxWait::Limited(Duration::from_secs(180)));
        assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);
        assert!(!config.respect_retry_after());
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            api_key: Some("secret".to_string()),
            base_url: "http://localhost:8080/api/".to_string(),
            api_job_status_polling_interval: 1,
            api_job_status_polling_wait: 3,
            ..Settings::default()
        };
        let config = ClientConfig::from_settings(&settings).unwrap();
        assert_eq!(config.api_key(), "secret");
        assert_eq!(config.polling_interval(), Duration::from_secs(1));
        assert_eq!(config.max_wait(), MaxWait::Limited(Duration::from_secs(3)));
        assert_eq!(
            config.endpoint_url("/finance/parse_invoice"),
            "http://localhost:8080/api/finance/parse_invoice"
        );
    }

    #[test]
    fn test_unbounded_wait_is_explicit() {
        let settings = Settings {
            api_key: Some("secret".to_string()),
            api_job_status_polling_wait: 0,
            api_job_status_polling_unbounded: true,
            ..Settings::default()
        };
        let config = ClientConfig::from_settings(&settings).unwrap();
        assert_eq!(config.max_wait(), MaxWait::Unbounded);
    }

    #[test]
    fn test_max_wait_semantics() {
        let zero = MaxWait::Limited(Duration::ZERO);
        assert!(zero.is_exceeded(Duration::ZERO));

        let three = MaxWait::Limited(Duration::from_secs(3));
        assert!(!three.is_exceeded(Duration::from_secs(3)));
        assert!(three.is_exceeded(Duration::from_millis(3001)));

        assert!(!MaxWait::Unbounded.is_exceeded(Duration::from_secs(u32::MAX as u64)));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ClientConfig::builder("key").base_url("sharpapi.com").build().unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_zero_request_timeout_is_rejected() {
        let err = ClientConfig::builder("key")
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let settings = Settings {
            api_key: Some("key".to_string()),
            request_timeout: 0,
            ..Settings::default()
        };
        assert!(matches!(ClientConfig::from_settings(&settings), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = ClientConfig::builder("super-secret").build().unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_settings_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let settings = Settings {
            api_key: Some("secret".to_string()),
            api_job_status_polling_interval: 2,
            ..Settings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::from_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_settings_file_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"api_key": "k"}"#).unwrap();
        assert_eq!(settings.api_job_status_polling_interval, 5);
        assert_eq!(settings.api_job_status_polling_wait, 180);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }
}
