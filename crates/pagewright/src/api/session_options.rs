// Session options
//
// Timeout, polling interval and base URL defaults for a Session. Options can
// be built in code, deserialized from JSON, or read from the environment.

use crate::error::{Error, Result};
use crate::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "PAGEWRIGHT_BASE_URL";
/// Environment variable overriding the default timeout (milliseconds)
pub const ENV_TIMEOUT_MS: &str = "PAGEWRIGHT_TIMEOUT_MS";
/// Environment variable overriding the polling interval (milliseconds)
pub const ENV_POLL_INTERVAL_MS: &str = "PAGEWRIGHT_POLL_INTERVAL_MS";

/// Options for creating a [`Session`](crate::Session)
///
/// # Example
///
/// ```ignore
/// use pagewright::SessionOptions;
///
/// let options = SessionOptions::new()
///     .base_url("http://127.0.0.1:9999")
///     .default_timeout_ms(2000)
///     .poll_interval_ms(25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionOptions {
    /// URL that relative `visit()` paths are resolved against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Retry budget of every chain, in milliseconds (default: 4000)
    pub default_timeout_ms: u64,

    /// Delay between retry attempts, in milliseconds (default: 50)
    pub poll_interval_ms: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl SessionOptions {
    /// Creates a new SessionOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the default chain timeout in milliseconds
    pub fn default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval in milliseconds
    pub fn poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Parses options from a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: SessionOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Defaults overridden by `PAGEWRIGHT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            options.base_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            options.default_timeout_ms = parse_millis(ENV_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            options.poll_interval_ms = parse_millis(ENV_POLL_INTERVAL_MS, &raw)?;
        }
        options.validate()?;
        Ok(options)
    }

    /// Checks that the interval is positive and fits in the timeout, and that
    /// the base URL parses.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("pollIntervalMs must be greater than 0".into()));
        }
        if self.poll_interval_ms > self.default_timeout_ms {
            return Err(Error::Config(format!(
                "pollIntervalMs ({}) must not exceed defaultTimeoutMs ({})",
                self.poll_interval_ms, self.default_timeout_ms
            )));
        }
        if let Some(base) = &self.base_url {
            url::Url::parse(base)
                .map_err(|e| Error::Config(format!("baseUrl '{}': {}", base, e)))?;
        }
        Ok(())
    }

    /// Default timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Polling interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be an integer, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.timeout(), Duration::from_millis(4000));
        assert_eq!(options.poll_interval(), Duration::from_millis(50));
        assert!(options.base_url.is_none());
    }

    #[test]
    fn test_from_json_partial() {
        let options =
            SessionOptions::from_json(r#"{"baseUrl": "http://127.0.0.1:9999", "pollIntervalMs": 100}"#)
                .unwrap();
        assert_eq!(options.base_url.as_deref(), Some("http://127.0.0.1:9999"));
        assert_eq!(options.poll_interval_ms, 100);
        assert_eq!(options.default_timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_serialize_camel_case() {
        let json = serde_json::to_value(SessionOptions::new().default_timeout_ms(1000)).unwrap();
        assert_eq!(json["defaultTimeoutMs"], 1000);
        assert_eq!(json["pollIntervalMs"], 50);
        assert!(json.get("baseUrl").is_none());
    }

    #[test]
    fn test_validation() {
        assert!(SessionOptions::new().poll_interval_ms(0).validate().is_err());
        assert!(
            SessionOptions::new()
                .default_timeout_ms(10)
                .poll_interval_ms(20)
                .validate()
                .is_err()
        );
        assert!(SessionOptions::new().base_url("not a url").validate().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://localhost:8080"),
            (ENV_TIMEOUT_MS, " 2500 "),
        ]
        .into_iter()
        .collect();
        let options = SessionOptions::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(options.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(options.default_timeout_ms, 2500);

        let err = SessionOptions::from_lookup(|k| {
            (k == ENV_POLL_INTERVAL_MS).then(|| "fast".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
