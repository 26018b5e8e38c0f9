//! DTOs for API responses.

use serde::Serialize;

/// Response for `GET /healthz`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always true while the process serves traffic
    pub ok: bool,
    /// Whether any fetch has succeeded yet
    pub cached: bool,
    /// Validator of the cached calendar
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    /// Seconds since the cached calendar was fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<u64>,
}
