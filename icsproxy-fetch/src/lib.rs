//! Upstream source for icsproxy.
//!
//! Fetches the configured calendar over HTTPS with reqwest, then hands the
//! raw bytes to `icsproxy-core` for normalization and fingerprinting.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod source;

pub use source::{FetchConfig, HttpSource};
