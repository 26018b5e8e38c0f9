//! # icsproxy API Server
//!
//! HTTP surface of the calendar proxy.
//!
//! ## Endpoints
//!
//! - `GET /healthz` - Liveness plus whether a calendar is cached
//! - `GET /calendar.ics` - The normalized upstream calendar, with ETag support
//!
//! ## Example
//!
//! ```rust,ignore
//! use icsproxy_api::{ApiServer, ApiConfig};
//!
//! let config = ApiConfig::from_env()?;
//! let server = ApiServer::new(config)?;
//! server.run(([0, 0, 0, 0], 8000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod routes;
mod handlers;
mod state;
mod dto;
mod error;

pub use routes::create_router;
pub use state::{AppState, ApiConfig};
pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use icsproxy_core::error::Result;

/// API server for icsproxy.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server with the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self::from_state(AppState::new(config)?))
    }

    /// Creates a server around prepared state.
    pub fn from_state(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::HEAD])
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl-C.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(
            upstream = %self.state.config.upstream_url,
            ttl_secs = self.state.config.cache_ttl_seconds,
            "icsproxy listening on {}",
            addr
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_end_to_end_against_upstream() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stundenplan.ics"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(&b"BEGIN:VCALENDAR\nBEGIN:VEVENT\r\nSUMMARY:Statistik\nEND:VEVENT\nEND:VCALENDAR\n"[..])
                    .insert_header("Last-Modified", "Thu, 03 Oct 2024 12:00:00 GMT"),
            )
            .expect(1)
            .mount(&upstream)
            .await;

        let config = ApiConfig::new(format!("{}/stundenplan.ics", upstream.uri()));
        let server = ApiServer::new(config).unwrap();
        let app = server.router();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/calendar.ics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let etag = response.headers()[header::ETAG].clone();
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            "Thu, 03 Oct 2024 12:00:00 GMT"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            &body[..],
            &b"BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:Statistik\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"[..]
        );

        // Second request is served from cache and revalidates.
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/calendar.ics")
                    .header(header::IF_NONE_MATCH, etag)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_upstream_not_found_is_bad_gateway() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&upstream)
            .await;

        let config = ApiConfig::new(format!("{}/missing.ics", upstream.uri()));
        let app = ApiServer::new(config).unwrap().router();

        let response = app
            .oneshot(Request::builder().uri("/calendar.ics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_server_rejects_invalid_config() {
        assert!(ApiServer::new(ApiConfig::new("mailto:someone@example.org")).is_err());
    }
}
