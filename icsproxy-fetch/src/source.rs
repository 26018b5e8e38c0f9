//! HTTP calendar source.
//!
//! One GET per refresh: redirects are followed, certificates are verified,
//! and the whole exchange (connect through body) is bounded by the
//! configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LAST_MODIFIED};
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use icsproxy_core::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, MAX_REDIRECTS, UPSTREAM_ACCEPT, UPSTREAM_USER_AGENT,
};
use icsproxy_core::error::{ProxyError, Result};
use icsproxy_core::traits::CalendarSource;
use icsproxy_core::types::FetchedCalendar;

/// Upstream source configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Upstream calendar URL
    pub url: String,
    /// Total request timeout in seconds (fractional allowed)
    pub timeout_seconds: f64,
}

impl FetchConfig {
    /// Creates config for `url` with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }

    /// Overrides the request timeout, in seconds.
    pub fn with_timeout(mut self, timeout_seconds: f64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Request timeout as a `Duration`. Fails unless the configured value is
    /// a positive number of seconds that fits in a `Duration`.
    pub fn timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or_else(|| {
                ProxyError::ConfigError(format!(
                    "fetch timeout must be a positive number of seconds, got {}",
                    self.timeout_seconds
                ))
            })
    }
}

/// Calendar source backed by reqwest.
pub struct HttpSource {
    config: FetchConfig,
    http_client: reqwest::Client,
}

impl HttpSource {
    /// Creates a source with the given config.
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let timeout = config.timeout()?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(UPSTREAM_USER_AGENT)
            .build()
            .map_err(|e| ProxyError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// The configured upstream URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn transport_error(&self, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            ProxyError::TransportError(format!(
                "timed out after {:.1}s fetching {}",
                self.config.timeout_seconds, self.config.url
            ))
        } else {
            ProxyError::TransportError(err.to_string())
        }
    }
}

#[async_trait]
impl CalendarSource for HttpSource {
    #[instrument(skip(self), fields(url = %self.config.url))]
    async fn fetch(&self) -> Result<FetchedCalendar> {
        let response = self
            .http_client
            .get(&self.config.url)
            .header(ACCEPT, UPSTREAM_ACCEPT)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamError {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let last_modified = match response.headers().get(LAST_MODIFIED) {
            Some(value) => match value.to_str() {
                Ok(v) => Some(v.to_owned()),
                Err(_) => {
                    warn!("Ignoring non-ASCII Last-Modified header");
                    None
                }
            },
            None => None,
        };

        let raw = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let calendar = FetchedCalendar::from_raw(&raw, last_modified);

        debug!(
            raw_bytes = raw.len(),
            normalized_bytes = calendar.len(),
            validator = %calendar.validator(),
            "Fetched upstream calendar"
        );
        Ok(calendar)
    }

    fn describe(&self) -> String {
        self.config.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icsproxy_core::compute_validator;
    use test_case::test_case;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &[u8] = b"BEGIN:VCALENDAR\nVERSION:2.0\r\nBEGIN:VEVENT\nSUMMARY:Analysis I\r\nEND:VEVENT\nEND:VCALENDAR\n";

    fn source_for(server: &MockServer, route: &str) -> HttpSource {
        let config = FetchConfig::new(format!("{}{}", server.uri(), route))
            .with_timeout(5.0);
        HttpSource::with_config(config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_normalizes_and_fingerprints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cal.ics"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(FEED)
                    .insert_header("Last-Modified", "Tue, 01 Oct 2024 08:00:00 GMT"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let calendar = source_for(&server, "/cal.ics").fetch().await.unwrap();

        let expected: &[u8] = b"BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nSUMMARY:Analysis I\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        assert_eq!(calendar.body().as_ref(), expected);
        assert_eq!(calendar.validator(), compute_validator(expected));
        assert_eq!(calendar.last_modified(), Some("Tue, 01 Oct 2024 08:00:00 GMT"));
    }

    #[tokio::test]
    async fn test_fetch_sends_accept_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cal.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(FEED))
            .mount(&server)
            .await;

        source_for(&server, "/cal.ics").fetch().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let headers = &requests[0].headers;
        assert_eq!(headers.get("accept").unwrap().to_str().unwrap(), UPSTREAM_ACCEPT);
        assert_eq!(
            headers.get("user-agent").unwrap().to_str().unwrap(),
            UPSTREAM_USER_AGENT
        );
    }

    #[tokio::test]
    async fn test_fetch_without_last_modified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(FEED))
            .mount(&server)
            .await;

        let calendar = source_for(&server, "/cal.ics").fetch().await.unwrap();
        assert!(calendar.last_modified().is_none());
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.ics"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/cal.ics", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cal.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(FEED))
            .mount(&server)
            .await;

        let calendar = source_for(&server, "/old.ics").fetch().await.unwrap();
        assert!(calendar.body().starts_with(b"BEGIN:VCALENDAR\r\n"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source_for(&server, "/cal.ics").fetch().await.unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamError { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(FEED)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = FetchConfig::new(format!("{}/cal.ics", server.uri()))
            .with_timeout(0.2);
        let source = HttpSource::with_config(config).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, ProxyError::TransportError(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        let config = FetchConfig::new("http://127.0.0.1:1/cal.ics");
        let source = HttpSource::with_config(config).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, ProxyError::TransportError(_)));
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-2.0 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinite")]
    #[test_case(1e20 ; "larger than a duration")]
    fn test_rejects_unusable_timeout(seconds: f64) {
        let mut config = FetchConfig::new("https://example.org/cal.ics");
        config.timeout_seconds = seconds;
        assert!(matches!(config.timeout(), Err(ProxyError::ConfigError(_))));
        assert!(matches!(
            HttpSource::with_config(config),
            Err(ProxyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_timeout_roundtrip() {
        let config = FetchConfig::new("https://example.org/cal.ics")
            .with_timeout(1.5);
        assert_eq!(config.timeout().unwrap(), Duration::from_millis(1500));
        assert_eq!(FetchConfig::new("x").timeout().unwrap(), Duration::from_secs(15));
    }
}
