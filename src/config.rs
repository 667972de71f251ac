use std::{fmt, sync::Arc};

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::{NetworkError, Result, RetryConfig};

/// Predicate deciding which statuses count as success.
pub type StatusValidator = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configures base URL, default headers, timeout, status validation and
/// retry behavior of a [`crate::Network`].
#[derive(Clone)]
pub struct NetworkConfig {
    /// Prefix for relative endpoints. May be empty when every call uses an
    /// absolute URL.
    pub base_url: String,
    /// Per-request timeout in milliseconds. Zero falls back to the default.
    pub timeout_ms: u64,
    /// Headers sent with every request, overridden by per-call headers.
    pub headers: HeaderMap,
    pub validate_status: StatusValidator,
    pub retry: RetryConfig,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("headers", &redacted_headers(&self.headers))
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            headers: default_headers(),
            validate_status: Arc::new(is_success_status),
            retry: RetryConfig::default(),
        }
    }
}

impl From<&str> for NetworkConfig {
    fn from(base_url: &str) -> Self {
        Self::default().with_base_url(base_url)
    }
}

impl From<String> for NetworkConfig {
    fn from(base_url: String) -> Self {
        Self::default().with_base_url(base_url)
    }
}

impl NetworkConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Adds or replaces a default header.
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self> {
        let (name, value) = parse_header(key, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn with_validate_status<F>(mut self, validate: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.validate_status = Arc::new(validate);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builds a configuration from environment variables.
    ///
    /// Reads:
    /// - `NETWORK_BASE_URL`: required, non-empty
    /// - `NETWORK_TIMEOUT_MS`: optional timeout override
    /// - `NETWORK_MAX_RETRIES`: optional retry count
    /// - `NETWORK_RETRY_DELAY_MS`: optional base backoff
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("NETWORK_BASE_URL").map_err(|_| {
            NetworkError::configuration("missing NETWORK_BASE_URL environment variable")
        })?;
        if base_url.trim().is_empty() {
            return Err(NetworkError::configuration(
                "NETWORK_BASE_URL is set but empty",
            ));
        }

        let mut config = Self::default().with_base_url(base_url.trim());
        if let Some(timeout_ms) = env_u64("NETWORK_TIMEOUT_MS")? {
            config.timeout_ms = timeout_ms;
        }
        if let Some(max_retries) = env_u64("NETWORK_MAX_RETRIES")? {
            config.retry.max_retries = usize::try_from(max_retries).map_err(|_| {
                NetworkError::configuration("NETWORK_MAX_RETRIES is out of range")
            })?;
        }
        if let Some(retry_delay_ms) = env_u64("NETWORK_RETRY_DELAY_MS")? {
            config.retry.retry_delay_ms = retry_delay_ms;
        }
        Ok(config)
    }

    pub(crate) fn effective_timeout_ms(&self) -> u64 {
        if self.timeout_ms == 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            self.timeout_ms
        }
    }
}

/// `Content-Type` and `Accept` set to `application/json`.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

pub(crate) fn parse_header(key: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    if key.trim().is_empty() {
        return Err(NetworkError::configuration(
            "Header key must be a non-empty string",
        ));
    }
    let name = HeaderName::from_bytes(key.trim().as_bytes())
        .map_err(|err| NetworkError::configuration(format!("invalid header name '{key}': {err}")))?;
    let value = HeaderValue::from_str(value).map_err(|err| {
        NetworkError::configuration(format!("invalid value for header '{key}': {err}"))
    })?;
    Ok((name, value))
}

pub(crate) fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if *name == header::AUTHORIZATION {
                "<redacted>".to_owned()
            } else {
                value.to_str().unwrap_or("<binary>").to_owned()
            };
            (name.as_str().to_owned(), shown)
        })
        .collect()
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|err| NetworkError::configuration(format!("{key} must be an integer: {err}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header;

    use crate::{NetworkConfig, NetworkError};

    #[test]
    fn defaults_match_documented_values() {
        let config = NetworkConfig::default();
        assert_eq!(config.base_url, "");
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(
            config.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(config.headers.get(header::ACCEPT).unwrap(), "application/json");
        assert!((config.validate_status)(200));
        assert!((config.validate_status)(299));
        assert!(!(config.validate_status)(199));
        assert!(!(config.validate_status)(300));
        assert_eq!(config.retry.max_retries, 0);
    }

    #[test]
    fn bare_string_becomes_base_url() {
        let config: NetworkConfig = "https://api.example.com".into();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn with_header_overrides_default_case_insensitively() {
        let config = NetworkConfig::default()
            .with_header("content-type", "text/plain")
            .unwrap();
        let values: Vec<_> = config.headers.get_all(header::CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["text/plain"]);
    }

    #[test]
    fn with_header_rejects_empty_key() {
        let err = NetworkConfig::default().with_header("  ", "x").unwrap_err();
        assert!(matches!(err, NetworkError::Configuration(_)));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let config = NetworkConfig::default().with_timeout_ms(0);
        assert_eq!(config.effective_timeout_ms(), 30_000);
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let config = NetworkConfig::default()
            .with_header("Authorization", "Token secret-token")
            .unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn from_env_reads_and_validates_variables() {
        const VARS: [&str; 4] = [
            "NETWORK_BASE_URL",
            "NETWORK_TIMEOUT_MS",
            "NETWORK_MAX_RETRIES",
            "NETWORK_RETRY_DELAY_MS",
        ];
        let clear = || {
            for key in VARS {
                std::env::remove_var(key);
            }
        };

        clear();
        let err = NetworkConfig::from_env().unwrap_err();
        assert!(matches!(err, NetworkError::Configuration(_)));

        std::env::set_var("NETWORK_BASE_URL", "   ");
        let err = NetworkConfig::from_env().unwrap_err();
        assert!(matches!(err, NetworkError::Configuration(_)));

        std::env::set_var("NETWORK_BASE_URL", " https://api.test ");
        std::env::set_var("NETWORK_TIMEOUT_MS", "abc");
        let err = NetworkConfig::from_env().unwrap_err();
        assert!(matches!(err, NetworkError::Configuration(_)));
        assert!(err.to_string().contains("NETWORK_TIMEOUT_MS"));

        std::env::set_var("NETWORK_TIMEOUT_MS", "5000");
        std::env::set_var("NETWORK_MAX_RETRIES", "3");
        std::env::set_var("NETWORK_RETRY_DELAY_MS", "250");
        let config = NetworkConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://api.test");
        assert_eq!(config.timeout_ms, 5_000);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.retry_delay_ms, 250);

        let network = crate::Network::from_env().unwrap();
        assert_eq!(network.base_url(), "https://api.test");

        clear();
        std::env::set_var("NETWORK_BASE_URL", "https://api.test");
        let config = NetworkConfig::from_env().unwrap();
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.retry_delay_ms, 1_000);

        clear();
    }
}
