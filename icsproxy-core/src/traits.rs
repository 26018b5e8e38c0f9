//! Common traits for icsproxy.
//!
//! The cache talks to upstream only through [`CalendarSource`], so tests
//! can substitute a counting or failing source for the real HTTP client.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::FetchedCalendar;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for retrieving the upstream calendar.
///
/// Implementations must bound their own duration: a call that exceeds its
/// timeout returns [`ProxyError::TransportError`](crate::ProxyError::TransportError)
/// instead of hanging.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Fetches, normalizes and fingerprints the upstream calendar.
    async fn fetch(&self) -> Result<FetchedCalendar>;

    /// Human-readable description of the upstream, for logs.
    fn describe(&self) -> String;
}
