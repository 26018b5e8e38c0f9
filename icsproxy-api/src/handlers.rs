//! API route handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, ETAG, IF_NONE_MATCH, LAST_MODIFIED,
        },
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use tokio::time::Instant;
use tracing::{debug, warn};

use icsproxy_cache::{etag_for, Resolution};
use icsproxy_core::constants::{CALENDAR_CONTENT_DISPOSITION, CALENDAR_CONTENT_TYPE};
use icsproxy_core::types::CacheEntry;

use crate::dto::HealthResponse;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /healthz
///
/// Reports whether a calendar is cached. Never contacts upstream.
pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let entry = state.cache.snapshot();

    Json(HealthResponse {
        ok: true,
        cached: entry.is_some(),
        validator: entry.as_ref().map(|e| e.validator().to_string()),
        age_seconds: entry.as_ref().map(|e| e.age(Instant::now()).as_secs()),
    })
}

/// GET /calendar.ics
///
/// Serves the cached calendar, refreshing it first when stale.
pub async fn calendar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    let if_none_match = match headers.get(IF_NONE_MATCH).map(|v| v.to_str()) {
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            debug!("Ignoring unreadable If-None-Match header");
            None
        }
        None => None,
    };

    let cache_control = cache_control(state.config.cache_ttl_seconds)?;

    match state.cache.resolve(if_none_match).await? {
        Resolution::NotModified(entry) => {
            let etag = etag_header(&entry)?;
            Ok((
                StatusCode::NOT_MODIFIED,
                [(ETAG, etag), (CACHE_CONTROL, cache_control)],
            )
                .into_response())
        }
        Resolution::Full(entry) => {
            let mut response_headers = HeaderMap::new();
            response_headers.insert(CONTENT_TYPE, HeaderValue::from_static(CALENDAR_CONTENT_TYPE));
            response_headers.insert(
                CONTENT_DISPOSITION,
                HeaderValue::from_static(CALENDAR_CONTENT_DISPOSITION),
            );
            response_headers.insert(CACHE_CONTROL, cache_control);
            response_headers.insert(ETAG, etag_header(&entry)?);

            if let Some(last_modified) = entry.last_modified() {
                match HeaderValue::from_str(last_modified) {
                    Ok(value) => {
                        response_headers.insert(LAST_MODIFIED, value);
                    }
                    Err(_) => warn!(last_modified, "Dropping unrepresentable Last-Modified"),
                }
            }

            Ok((
                StatusCode::OK,
                response_headers,
                Body::from(entry.body().clone()),
            )
                .into_response())
        }
    }
}

fn cache_control(ttl_seconds: u64) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("public, max-age={}", ttl_seconds))
        .map_err(|e| ApiError::internal(format!("Invalid Cache-Control value: {}", e)))
}

fn etag_header(entry: &CacheEntry) -> Result<HeaderValue> {
    HeaderValue::from_str(&etag_for(entry.validator()))
        .map_err(|e| ApiError::internal(format!("Invalid ETag value: {}", e)))
}
