//! Error types for icsproxy.
//!
//! Three failure classes exist: bad configuration (fatal at startup), and
//! two kinds of refresh failure that the cache can recover from by serving
//! a stale entry.

use thiserror::Error;

/// Result type alias using `ProxyError`.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Main error type for all icsproxy operations.
///
/// `Clone` so that every request coalesced onto one failed refresh can
/// receive its own copy of the failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // REFRESH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Connect, TLS, timeout, or body-read failure while talking to upstream.
    #[error("Upstream transport failed: {0}")]
    TransportError(String),

    /// Upstream answered with a non-success status.
    #[error("Upstream {url} returned HTTP {status}")]
    UpstreamError {
        /// HTTP status code returned by upstream.
        status: u16,
        /// URL that produced the status.
        url: String,
    },
}

impl ProxyError {
    /// Returns true if a later refresh may succeed where this one failed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProxyError::TransportError(_) | ProxyError::UpstreamError { .. }
        )
    }
}
