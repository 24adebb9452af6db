use std::env::vars;
use std::time::Duration;

use log::info;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://frontend-test-assignment-api.abz.agency/api/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(40 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("Failed to read environment: {0}")]
    Env(String),
}

#[derive(Debug, Clone)]
pub struct BusinessConfig {
    pub api_base_url: Url,
    /// Users requested per page. The server caps this at 100.
    pub page_size: u32,
    /// How long a fetched token is reused before a new one is requested.
    pub token_ttl: Duration,
    /// Per-request timeout for the reqwest gateway. `None` keeps reqwest's default.
    pub request_timeout: Option<Duration>,
    /// Maximum number of distinct avatar URLs kept in the image cache.
    ///
    /// `None` means unbounded. Once full, new URLs are still fetched but not cached.
    pub image_cache_capacity: Option<usize>,
}

// Environment variables, all optional.
#[derive(Deserialize)]
struct RawConfig {
    roster_api_base_url: Option<String>,
    roster_page_size: Option<u32>,
    roster_token_ttl_minutes: Option<u64>,
    roster_request_timeout_secs: Option<u64>,
    roster_image_cache_capacity: Option<usize>,
}

impl BusinessConfig {
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            ..Self::default()
        }
    }

    /// Parse `base_url` and build a config around it.
    ///
    /// Used by tests pointing at a mock server (`MockServer::uri()`).
    pub fn from_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_base_url(base_url)?))
    }

    /// Users per page requested from `/users`.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Limit how many avatar URLs the cache keeps. `None` is unbounded.
    pub fn with_image_cache_capacity(mut self, capacity: Option<usize>) -> Self {
        self.image_cache_capacity = capacity;
        self
    }

    /// Build a config from `ROSTER_*` environment variables, falling back to defaults.
    ///
    /// - `ROSTER_API_BASE_URL`
    /// - `ROSTER_PAGE_SIZE`
    /// - `ROSTER_TOKEN_TTL_MINUTES`
    /// - `ROSTER_REQUEST_TIMEOUT_SECS`
    /// - `ROSTER_IMAGE_CACHE_CAPACITY`
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_env::from_iter(vars()).map_err(|e| ConfigError::Env(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let RawConfig {
            roster_api_base_url,
            roster_page_size,
            roster_token_ttl_minutes,
            roster_request_timeout_secs,
            roster_image_cache_capacity,
        } = raw;

        let mut config = Self::default();

        if let Some(url) = roster_api_base_url {
            info!("Using provided ROSTER_API_BASE_URL: {url}");
            config.api_base_url = parse_base_url(&url)?;
        }

        if let Some(page_size) = roster_page_size {
            if !(1..=100).contains(&page_size) {
                return Err(ConfigError::InvalidValue {
                    name: "ROSTER_PAGE_SIZE",
                    reason: format!("{page_size} is outside 1..=100"),
                });
            }
            config.page_size = page_size;
        }

        if let Some(minutes) = roster_token_ttl_minutes {
            config.token_ttl = Duration::from_secs(minutes.saturating_mul(60));
        }

        if let Some(secs) = roster_request_timeout_secs {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if roster_image_cache_capacity.is_some() {
            config.image_cache_capacity = roster_image_cache_capacity;
        }

        Ok(config)
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            page_size: DEFAULT_PAGE_SIZE,
            token_ttl: DEFAULT_TOKEN_TTL,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            image_cache_capacity: None,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("DEFAULT_API_BASE_URL is a valid URL")
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_owned(),
            reason: "expected an http(s) base URL".to_owned(),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    #[test]
    fn defaults_point_at_public_api() {
        let config = BusinessConfig::default();
        assert_eq!(config.api_base_url.as_str(), DEFAULT_API_BASE_URL);
        assert_eq!(config.page_size, 6);
        assert_eq!(config.token_ttl, Duration::from_secs(2400));
        assert!(config.image_cache_capacity.is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let raw: RawConfig = from_iter(vec![
            ("ROSTER_API_BASE_URL", "http://127.0.0.1:9000/api/v1"),
            ("ROSTER_PAGE_SIZE", "12"),
            ("ROSTER_TOKEN_TTL_MINUTES", "5"),
            ("ROSTER_REQUEST_TIMEOUT_SECS", "0"),
            ("ROSTER_IMAGE_CACHE_CAPACITY", "64"),
        ])
        .expect("RawConfig should deserialize");

        let config = BusinessConfig::from_raw(raw).expect("config should build");
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:9000/api/v1");
        assert_eq!(config.page_size, 12);
        assert_eq!(config.token_ttl, Duration::from_secs(300));
        assert!(config.request_timeout.is_none());
        assert_eq!(config.image_cache_capacity, Some(64));
    }

    #[test]
    fn empty_env_keeps_defaults() {
        let raw: RawConfig =
            from_iter(Vec::<(&str, &str)>::new()).expect("RawConfig should deserialize");
        let config = BusinessConfig::from_raw(raw).expect("config should build");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.request_timeout, Some(DEFAULT_REQUEST_TIMEOUT));
    }

    #[test]
    fn page_size_out_of_range_is_rejected() {
        let raw: RawConfig =
            from_iter(vec![("ROSTER_PAGE_SIZE", "0")]).expect("RawConfig should deserialize");
        let err = BusinessConfig::from_raw(raw).unwrap_err();
        assert!(err.to_string().contains("ROSTER_PAGE_SIZE"));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        assert!(BusinessConfig::from_base_url("mailto:someone@example.com").is_err());
        assert!(BusinessConfig::from_base_url("not a url").is_err());
        assert!(BusinessConfig::from_base_url("http://127.0.0.1:8080").is_ok());
    }
}
