//! Stable 128-bit fingerprints for source items.
//!
//! The fingerprint is the key a Source Item is stored under in the
//! Segment Bundle Store. No canonicalization is attempted (symlinks are
//! not resolved, case is not normalized) — identity is the literal path
//! string handed to us. Moving a file to a new path regenerates its bundle.

use sha2::{Digest, Sha256};

/// Derive a 128-bit fingerprint for a source path, rendered as 32 lowercase
/// hex characters. Built from the leading 16 bytes of a SHA-256 digest of
/// the path's bytes — collision probability is negligible at this width.
pub fn fingerprint(path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}
