//! Domain types: the fetched calendar and the cache entry built from it.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::content::{compute_validator, normalize};

/// A normalized, fingerprinted upstream calendar.
///
/// Only constructible from raw bytes, so `validator` is always the
/// fingerprint of `body`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedCalendar {
    body: Bytes,
    validator: String,
    last_modified: Option<String>,
}

impl FetchedCalendar {
    /// Normalizes `raw` and fingerprints the result.
    ///
    /// `last_modified` is the upstream `Last-Modified` header, kept verbatim.
    pub fn from_raw(raw: &[u8], last_modified: Option<String>) -> Self {
        let body = normalize(raw);
        let validator = compute_validator(&body);
        Self {
            body: Bytes::from(body),
            validator,
            last_modified,
        }
    }

    /// Normalized body (UTF-8, CRLF line breaks).
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Hex-encoded SHA3-256 of [`body`](Self::body).
    pub fn validator(&self) -> &str {
        &self.validator
    }

    /// Upstream `Last-Modified`, if it sent one.
    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    /// Size of the normalized body in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns true if the normalized body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// The single cached calendar plus the time it was stored.
///
/// Immutable: a refresh builds a new entry and swaps it in whole.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    calendar: FetchedCalendar,
    fetched_at: Instant,
}

impl CacheEntry {
    /// Wraps a fetched calendar stamped with `fetched_at`.
    pub fn new(calendar: FetchedCalendar, fetched_at: Instant) -> Self {
        Self {
            calendar,
            fetched_at,
        }
    }

    /// Normalized body of the cached calendar.
    pub fn body(&self) -> &Bytes {
        self.calendar.body()
    }

    /// Validator of the cached calendar.
    pub fn validator(&self) -> &str {
        self.calendar.validator()
    }

    /// Passthrough `Last-Modified` of the cached calendar.
    pub fn last_modified(&self) -> Option<&str> {
        self.calendar.last_modified()
    }

    /// Age of the entry at `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// Stale once the age strictly exceeds `ttl`.
    pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) > ttl
    }
}
