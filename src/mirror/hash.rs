//! Content hashing for mirror files.
//!
//! SHA256 over the serialized file content lets a pull report which
//! collections actually changed since the previous snapshot.

use sha2::{Digest, Sha256};

/// Compute the hex SHA256 of `content`.
#[must_use]
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Short form of a content hash for display.
#[must_use]
pub fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(content_hash(b"[]"), content_hash(b"[]"));
        assert_eq!(content_hash(b"[]").len(), 64);
    }

    #[test]
    fn test_hash_changes_with_content() {
        assert_ne!(content_hash(b"[]"), content_hash(b"[{}]"));
    }

    #[test]
    fn test_short_hash() {
        let hash = content_hash(b"abc");
        assert_eq!(short_hash(&hash).len(), 12);
        assert_eq!(short_hash("abc"), "abc");
    }
}
