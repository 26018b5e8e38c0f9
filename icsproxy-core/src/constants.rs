//! Protocol constants for icsproxy.
//!
//! Header values and defaults shared by the fetcher, the cache, and the
//! HTTP surface.

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

/// `Accept` header sent upstream. Prefers calendar content but takes anything.
pub const UPSTREAM_ACCEPT: &str = "text/calendar, */*;q=0.1";

/// `User-Agent` header sent upstream.
pub const UPSTREAM_USER_AGENT: &str = "ICS-Proxy/1.0 (+compatible)";

/// Maximum number of redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// DOWNSTREAM RESPONSE
// ═══════════════════════════════════════════════════════════════════════════════

/// `Content-Type` of the served calendar.
pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// `Content-Disposition` of the served calendar.
pub const CALENDAR_CONTENT_DISPOSITION: &str = "attachment; filename=\"hochschule.ics\"";

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Length of a validator: hex-encoded SHA3-256 digest.
pub const VALIDATOR_HEX_LEN: usize = 64;

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default upstream fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: f64 = 15.0;

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Environment variable holding the upstream calendar URL (required).
pub const ENV_UPSTREAM_URL: &str = "UPSTREAM_ICS_URL";

/// Environment variable holding the fetch timeout in seconds.
pub const ENV_FETCH_TIMEOUT: &str = "FETCH_TIMEOUT";

/// Environment variable holding the cache TTL in seconds.
pub const ENV_CACHE_TTL: &str = "CACHE_TTL_SECONDS";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_names_ics_file() {
        assert!(CALENDAR_CONTENT_DISPOSITION.starts_with("attachment"));
        assert!(CALENDAR_CONTENT_DISPOSITION.contains(".ics\""));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_CACHE_TTL_SECS, 300);
        assert!(DEFAULT_FETCH_TIMEOUT_SECS > 0.0);
    }
}
