//! Content hashing for change detection.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

/// Compute the content hash of an item.
///
/// SHA-256 over length-prefixed fields, so the digest is deterministic and
/// cannot be confused by delimiter-looking content. Two items hash equal
/// exactly when title, body, scope and revision all match; remote bodies
/// never need to be compared directly.
#[must_use]
pub fn content_hash(title: &str, body: &str, scope_key: &str, revision: Option<i64>) -> String {
    let mut hasher = Sha256::new();
    for field in [title, body, scope_key] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    match revision {
        Some(rev) => {
            hasher.update([1u8]);
            hasher.update(rev.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }

    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
