//! TTL cache for the upstream calendar.
//!
//! Holds exactly one entry, refreshes it lazily when a request finds it
//! stale, and coalesces concurrent refreshes into a single upstream call.

mod cache;
mod conditional;

pub use cache::{CacheConfig, CalendarCache, Freshness, Resolution};
pub use conditional::{etag_for, matches_if_none_match};
