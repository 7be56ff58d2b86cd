//! Collection name sanitization.
//!
//! Collection names must satisfy `^[A-Za-z0-9][A-Za-z0-9._-]{1,510}[A-Za-z0-9]$`:
//! ASCII alphanumerics plus `.`, `_`, `-`, length 3-512, alphanumeric at
//! both ends. Invalid names are rewritten deterministically, and any name
//! that had to be rewritten gets a short hash of the original appended,
//! so two distinct originals can never end up under the same identifier.

use sha2::{Digest, Sha256};

/// Maximum sanitized name length.
const MAX_LEN: usize = 512;

/// Minimum sanitized name length.
const MIN_LEN: usize = 3;

/// Hash suffix length in hex characters.
const SUFFIX_LEN: usize = 6;

/// Sanitize a collection name.
///
/// Deterministic and idempotent: a name that already satisfies the
/// constraints passes through unchanged, and sanitizing a sanitized
/// name is a no-op.
pub fn sanitize_collection_name(name: &str) -> String {
    // Replace runs of disallowed characters with a single '-'
    let mut replaced = String::with_capacity(name.len());
    let mut last_was_sub = false;
    for c in name.chars() {
        if is_allowed(c) {
            replaced.push(c);
            last_was_sub = false;
        } else if !last_was_sub {
            replaced.push('-');
            last_was_sub = true;
        }
    }

    // Trim to alphanumeric boundaries
    let trimmed = replaced.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    let mut sanitized = trimmed.to_string();

    if sanitized.is_empty() {
        return format!("collection-{}", short_hash(name));
    }

    let altered = sanitized != name || sanitized.len() > MAX_LEN;

    if altered {
        // The sanitized form is pure ASCII, so byte truncation is safe
        if sanitized.len() > MAX_LEN - SUFFIX_LEN - 1 {
            sanitized.truncate(MAX_LEN - SUFFIX_LEN - 1);
            sanitized = sanitized
                .trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_string();
        }
        sanitized = format!("{}-{}", sanitized, short_hash(name));
    } else if sanitized.len() < MIN_LEN {
        // Valid but too short
        sanitized = format!("{}-{}", sanitized, short_hash(name));
    }

    sanitized
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Short, stable hash of the original name.
fn short_hash(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    digest
        .iter()
        .take(SUFFIX_LEN / 2)
        .map(|b| format!("{:02x}", b))
        .collect()
}
