//! # icsproxy Core
//!
//! Core types, errors, and traits for icsproxy, a caching reverse proxy for
//! a single upstream iCalendar feed.
//!
//! - **Content**: line-ending normalization and the SHA3-256 validator
//! - **Types**: the fetched calendar and the cache entry
//! - **Errors**: configuration, transport and upstream failures
//! - **Traits**: the upstream source seam
//!
//! ## Example
//!
//! ```rust
//! use icsproxy_core::FetchedCalendar;
//!
//! let cal = FetchedCalendar::from_raw(b"BEGIN:VCALENDAR\nEND:VCALENDAR\n", None);
//! assert_eq!(cal.body().as_ref(), b"BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n");
//! assert_eq!(cal.validator().len(), 64);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod content;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use content::{compute_validator, normalize};
pub use error::{ProxyError, Result};
pub use traits::*;
pub use types::*;
