//! Calendar content normalization and fingerprinting.
//!
//! Upstream calendars arrive with whatever encoding and line endings the
//! publisher produced. Before caching, the body is decoded as UTF-8 (lossy),
//! every line break is rewritten to CRLF as RFC 5545 requires, and the result
//! is fingerprinted with SHA3-256.
//!
//! ```text
//! raw bytes ──► lossy UTF-8 ──► CRLF line breaks ──► UTF-8 bytes ──► SHA3-256 hex
//! ```

use sha3::{Digest, Sha3_256};

// ═══════════════════════════════════════════════════════════════════════════════
// NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Normalizes a raw calendar body.
///
/// Invalid UTF-8 sequences become U+FFFD. CRLF, lone CR and lone LF are all
/// treated as one line break each and written back as CRLF. Never fails.
///
/// The function is idempotent: feeding its output back in returns the same
/// bytes.
pub fn normalize(raw: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(raw);
    let mut out = String::with_capacity(text.len() + text.len() / 32);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\r\n");
            }
            '\n' => out.push_str("\r\n"),
            other => out.push(other),
        }
    }

    out.into_bytes()
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes the validator (strong ETag value) for a normalized body.
///
/// Lowercase hex of the SHA3-256 digest, always [`VALIDATOR_HEX_LEN`](crate::constants::VALIDATOR_HEX_LEN) chars.
pub fn compute_validator(body: &[u8]) -> String {
    let digest = Sha3_256::digest(body);
    hex::encode(digest)
}
