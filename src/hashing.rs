//! Canonical serialization and digest computation.
//!
//! Every digest in the ledger (block hashes, chain-linkage checks, integrity
//! seals) goes through [`hash_canonical`] so that two semantically identical
//! structures always produce byte-identical serializations and therefore the
//! same digest, regardless of field declaration or construction order.

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Computes the hex-encoded SHA-256 digest of a value's canonical JSON form.
///
/// The value is first converted to a `serde_json::Value`; serde_json's map
/// type is BTree-backed, so object keys are rendered in sorted order. The
/// compact rendering of that value is the canonical byte sequence. Pure
/// function, no side effects.
pub fn hash_canonical<T: serde::Serialize>(value: &T) -> Result<String> {
    let canonical = serde_json::to_value(value)?;
    let json = serde_json::to_string(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Computes the hex-encoded SHA-256 digest of a raw byte sequence.
///
/// Used by the proof-of-work engine, where the guess is already a canonical
/// byte string and JSON framing would only distort the search predicate.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Forward {
        alpha: u32,
        beta: String,
    }

    // Same fields, reversed declaration order.
    #[derive(Serialize)]
    struct Backward {
        beta: String,
        alpha: u32,
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = hash_canonical(&"hello").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_field_order_does_not_change_digest() {
        let f = Forward {
            alpha: 7,
            beta: "x".to_string(),
        };
        let b = Backward {
            beta: "x".to_string(),
            alpha: 7,
        };
        assert_eq!(hash_canonical(&f).unwrap(), hash_canonical(&b).unwrap());
    }

    #[test]
    fn test_value_change_changes_digest() {
        let a = Forward {
            alpha: 7,
            beta: "x".to_string(),
        };
        let b = Forward {
            alpha: 8,
            beta: "x".to_string(),
        };
        assert_ne!(hash_canonical(&a).unwrap(), hash_canonical(&b).unwrap());
    }

    #[test]
    fn test_hash_bytes_deterministic() {
        assert_eq!(hash_bytes(b"100835"), hash_bytes(b"100835"));
        assert_ne!(hash_bytes(b"100835"), hash_bytes(b"100836"));
    }
}
