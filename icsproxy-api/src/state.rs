//! App state: configuration and the calendar cache.

use std::sync::Arc;

use url::Url;

use icsproxy_cache::{CacheConfig, CalendarCache};
use icsproxy_core::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_TIMEOUT_SECS, ENV_CACHE_TTL, ENV_FETCH_TIMEOUT,
    ENV_UPSTREAM_URL,
};
use icsproxy_core::error::{ProxyError, Result};
use icsproxy_core::traits::CalendarSource;
use icsproxy_fetch::{FetchConfig, HttpSource};

/// Server configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Upstream calendar URL
    pub upstream_url: String,
    /// Upstream fetch timeout in seconds
    pub fetch_timeout_seconds: f64,
    /// Cache TTL in seconds
    pub cache_ttl_seconds: u64,
}

impl ApiConfig {
    /// Config for `upstream_url` with default timeout and TTL.
    pub fn new(upstream_url: impl Into<String>) -> Self {
        Self {
            upstream_url: upstream_url.into(),
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECS,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECS,
        }
    }

    /// Reads `UPSTREAM_ICS_URL`, `FETCH_TIMEOUT` and `CACHE_TTL_SECONDS`,
    /// loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let upstream_url = lookup(ENV_UPSTREAM_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ProxyError::ConfigError(format!(
                    "{} must be set to the upstream calendar URL",
                    ENV_UPSTREAM_URL
                ))
            })?;

        let fetch_timeout_seconds = match lookup(ENV_FETCH_TIMEOUT) {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .ok_or_else(|| {
                    ProxyError::ConfigError(format!(
                        "{} must be a positive number of seconds, got '{}'",
                        ENV_FETCH_TIMEOUT, raw
                    ))
                })?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let cache_ttl_seconds = match lookup(ENV_CACHE_TTL) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ProxyError::ConfigError(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_CACHE_TTL, raw
                ))
            })?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let config = Self {
            upstream_url,
            fetch_timeout_seconds,
            cache_ttl_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the upstream URL is an absolute http(s) URL and that the
    /// fetch timeout is usable.
    pub fn validate(&self) -> Result<()> {
        self.fetch_config().timeout()?;

        let url = Url::parse(&self.upstream_url).map_err(|e| {
            ProxyError::ConfigError(format!("invalid upstream URL '{}': {}", self.upstream_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ProxyError::ConfigError(format!(
                "upstream URL must use http or https, got '{}'",
                other
            ))),
        }
    }

    /// Fetcher settings derived from this config.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::new(&self.upstream_url).with_timeout(self.fetch_timeout_seconds)
    }

    /// Cache settings derived from this config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl_seconds: self.cache_ttl_seconds,
        }
    }
}

/// Shared state handed to every handler.
pub struct AppState {
    /// Settings the server was started with
    pub config: ApiConfig,
    /// The single cached calendar and its refresh guard
    pub cache: CalendarCache,
}

impl AppState {
    /// Builds state with the HTTP source for `config.upstream_url`.
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;
        let source = HttpSource::with_config(config.fetch_config())?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Builds state around an arbitrary source.
    pub fn with_source(config: ApiConfig, source: Arc<dyn CalendarSource>) -> Self {
        let cache = CalendarCache::new(source, config.cache_config());
        Self { config, cache }
    }
}
