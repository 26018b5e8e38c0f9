//! Single-entry calendar cache with coalesced refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use icsproxy_core::constants::DEFAULT_CACHE_TTL_SECS;
use icsproxy_core::error::{ProxyError, Result};
use icsproxy_core::traits::CalendarSource;
use icsproxy_core::types::CacheEntry;

use crate::conditional::matches_if_none_match;

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds an entry is served without asking upstream again
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// State of the cache as seen by an incoming request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing has been fetched successfully yet.
    Empty,
    /// Entry exists and is within its TTL.
    Fresh,
    /// Entry exists but has outlived its TTL.
    Stale,
}

/// Outcome of resolving a request against the cache.
#[derive(Clone, Debug)]
pub enum Resolution {
    /// Client already holds the current representation.
    NotModified(Arc<CacheEntry>),
    /// Client needs the full body.
    Full(Arc<CacheEntry>),
}

/// The process-wide calendar cache.
///
/// Readers take an `Arc` snapshot of the entry, so a swap can never be
/// observed half done. Every refresh runs under `refresh_lock`; requests
/// that queue on the lock while another refresh is in flight adopt that
/// refresh's outcome instead of calling upstream again.
pub struct CalendarCache {
    source: Arc<dyn CalendarSource>,
    config: CacheConfig,
    entry: RwLock<Option<Arc<CacheEntry>>>,
    /// Held for the whole fetch-and-swap; holds the last attempt's failure.
    refresh_lock: Mutex<Option<ProxyError>>,
    /// Completed refresh attempts. Bumped under `refresh_lock`, after the swap.
    attempts: AtomicU64,
}

impl CalendarCache {
    /// Creates an empty cache in front of `source`.
    pub fn new(source: Arc<dyn CalendarSource>, config: CacheConfig) -> Self {
        Self {
            source,
            config,
            entry: RwLock::new(None),
            refresh_lock: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.config.ttl()
    }

    /// Current entry, fresh or not. Never triggers a fetch.
    pub fn snapshot(&self) -> Option<Arc<CacheEntry>> {
        self.entry.read().clone()
    }

    /// Returns true once any fetch has succeeded.
    pub fn is_populated(&self) -> bool {
        self.entry.read().is_some()
    }

    /// Number of refresh attempts that ran to completion.
    pub fn refresh_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Classifies the cache at `now`.
    pub fn freshness(&self, now: Instant) -> Freshness {
        match self.snapshot() {
            None => Freshness::Empty,
            Some(entry) if entry.is_stale(now, self.ttl()) => Freshness::Stale,
            Some(_) => Freshness::Fresh,
        }
    }

    /// Returns an entry to serve, refreshing first if needed.
    ///
    /// - Fresh: returned as is.
    /// - Empty: refresh; a failure is returned to the caller.
    /// - Stale: refresh; on failure the stale entry is returned instead.
    pub async fn current(&self) -> Result<Arc<CacheEntry>> {
        // Load the attempt counter before the entry: if a refresh completes
        // after this point, the counter check below catches it.
        let seen = self.attempts.load(Ordering::Acquire);
        let observed = self.snapshot();

        if let Some(entry) = &observed {
            if !entry.is_stale(Instant::now(), self.ttl()) {
                debug!(validator = %entry.validator(), "Cache hit");
                return Ok(entry.clone());
            }
        }

        let mut last_failure = self.refresh_lock.lock().await;

        if self.attempts.load(Ordering::Acquire) != seen {
            // A refresh finished while we waited for the lock: share its outcome.
            if let Some(entry) = self.snapshot() {
                return Ok(entry);
            }
            if let Some(err) = last_failure.as_ref() {
                return Err(err.clone());
            }
        }

        let result = self.refresh(&mut last_failure).await;
        self.attempts.fetch_add(1, Ordering::Release);
        result
    }

    /// Fetches upstream and swaps the entry. Caller holds `refresh_lock`.
    async fn refresh(&self, last_failure: &mut Option<ProxyError>) -> Result<Arc<CacheEntry>> {
        let started = Instant::now();

        match self.source.fetch().await {
            Ok(calendar) => {
                let entry = Arc::new(CacheEntry::new(calendar, Instant::now()));
                *self.entry.write() = Some(entry.clone());
                *last_failure = None;

                info!(
                    upstream = %self.source.describe(),
                    bytes = entry.body().len(),
                    validator = %entry.validator(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Calendar refreshed"
                );
                Ok(entry)
            }
            Err(err) => {
                *last_failure = Some(err.clone());

                match self.snapshot() {
                    Some(stale) => {
                        warn!(
                            error = %err,
                            age_secs = stale.age(Instant::now()).as_secs(),
                            "Refresh failed, serving stale calendar"
                        );
                        Ok(stale)
                    }
                    None => {
                        error!(error = %err, "Refresh failed with nothing cached");
                        Err(err)
                    }
                }
            }
        }
    }

    /// Resolves a request carrying an optional `If-None-Match` value.
    pub async fn resolve(&self, if_none_match: Option<&str>) -> Result<Resolution> {
        let entry = self.current().await?;

        match if_none_match {
            Some(header) if matches_if_none_match(header, entry.validator()) => {
                debug!(validator = %entry.validator(), "Client validator matches");
                Ok(Resolution::NotModified(entry))
            }
            _ => Ok(Resolution::Full(entry)),
        }
    }
}
