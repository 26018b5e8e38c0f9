//! `If-None-Match` evaluation against the cached validator.
//!
//! Matching is permissive: anything that does not parse as a matching tag
//! simply does not match, and the caller serves the full body.

/// Quotes a validator for use as an `ETag` header value.
pub fn etag_for(validator: &str) -> String {
    format!("\"{}\"", validator)
}

/// Returns true if an `If-None-Match` header value matches `validator`.
///
/// Accepts a single tag or a comma-separated list. Surrounding quotes and a
/// weak `W/` prefix are ignored; `*` matches any validator.
pub fn matches_if_none_match(header: &str, validator: &str) -> bool {
    header
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .any(|candidate| candidate == "*" || unquote(candidate) == validator)
}

fn unquote(tag: &str) -> &str {
    let tag = tag.strip_prefix("W/").unwrap_or(tag);
    tag.trim_matches('"')
}
