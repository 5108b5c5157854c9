//! Integrity sealer: tamper-detection digests for trade records.
//!
//! A seal digest is computed over a canonical payload of exactly six fields
//! with fixed types, anchored into the ledger as a synthetic transaction,
//! and made durable by an immediate seal cycle. Verification recomputes the
//! digest from the fields as the caller currently knows them and compares
//! byte-for-byte; it never reads or mutates the ledger.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::chain::Chain;
use crate::core::transaction::Transaction;
use crate::error::Result;
use crate::hashing::hash_canonical;

/// Canonical seal payload. Identifiers, crop, and order id are strings;
/// quantity and price are floating-point. Key order never affects the
/// digest (canonical serialization sorts keys).
#[derive(Debug, Serialize)]
struct SealPayload {
    farmer_id: String,
    buyer_id: String,
    crop: String,
    quantity: f64,
    price: f64,
    order_id: String,
}

/// Outcome of an integrity verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyReport {
    pub is_authentic: bool,
    pub recomputed_digest: String,
    pub stored_digest: String,
    pub tampered_detected: bool,
}

/// Computes the seal digest over the six canonical fields.
pub fn compute_digest(
    farmer_id: &str,
    buyer_id: &str,
    crop: &str,
    quantity: f64,
    price: f64,
    order_id: &str,
) -> Result<String> {
    let payload = SealPayload {
        farmer_id: farmer_id.to_string(),
        buyer_id: buyer_id.to_string(),
        crop: crop.to_string(),
        quantity,
        price,
        order_id: order_id.to_string(),
    };
    hash_canonical(&payload)
}

/// Generates the integrity digest for a trade, logs a seal event into the
/// pending pool, and immediately drives one full seal cycle so the digest
/// is durably anchored before the caller treats it as authoritative.
pub fn seal(
    chain: &Chain,
    farmer_id: &str,
    buyer_id: &str,
    crop: &str,
    quantity: f64,
    price: f64,
    order_id: &str,
) -> Result<String> {
    let digest = compute_digest(farmer_id, buyer_id, crop, quantity, price, order_id)?;

    chain.add_transaction(Transaction::integrity_marker(
        farmer_id, buyer_id, crop, quantity, price, order_id,
    ));
    let block = chain.seal_block()?;
    info!(block = block.index, order_id, "integrity seal anchored");

    Ok(digest)
}

/// Recomputes the digest from the caller's current view of the fields and
/// compares it against `stored_digest`. Any mismatch, including a changed
/// value or transposed fields, is reported as tampering. Pure verification;
/// no ledger mutation.
pub fn verify(
    farmer_id: &str,
    buyer_id: &str,
    crop: &str,
    quantity: f64,
    price: f64,
    order_id: &str,
    stored_digest: &str,
) -> Result<VerifyReport> {
    let recomputed = compute_digest(farmer_id, buyer_id, crop, quantity, price, order_id)?;
    let is_authentic = recomputed == stored_digest;
    Ok(VerifyReport {
        is_authentic,
        recomputed_digest: recomputed,
        stored_digest: stored_digest.to_string(),
        tampered_detected: !is_authentic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::SnapshotStore;
    use tempfile::TempDir;

    #[test]
    fn test_seal_then_verify_authentic() {
        let dir = TempDir::new().unwrap();
        let chain = Chain::load_or_genesis(SnapshotStore::new(dir.path())).unwrap();

        let digest = seal(&chain, "F1", "B2", "Wheat", 10.0, 2200.0, "ORD-9").unwrap();
        let report = verify("F1", "B2", "Wheat", 10.0, 2200.0, "ORD-9", &digest).unwrap();
        assert!(report.is_authentic);
        assert!(!report.tampered_detected);
        assert_eq!(report.recomputed_digest, digest);
    }

    #[test]
    fn test_changed_price_detected_as_tampering() {
        let digest = compute_digest("F1", "B2", "Wheat", 10.0, 2200.0, "ORD-9").unwrap();
        let report = verify("F1", "B2", "Wheat", 10.0, 2201.0, "ORD-9", &digest).unwrap();
        assert!(!report.is_authentic);
        assert!(report.tampered_detected);
        assert_ne!(report.recomputed_digest, report.stored_digest);
    }

    #[test]
    fn test_transposed_fields_detected_as_tampering() {
        let digest = compute_digest("F1", "B2", "Wheat", 10.0, 2200.0, "ORD-9").unwrap();
        let report = verify("B2", "F1", "Wheat", 10.0, 2200.0, "ORD-9", &digest).unwrap();
        assert!(report.tampered_detected);
    }

    #[test]
    fn test_seal_anchors_marker_and_advances_chain() {
        let dir = TempDir::new().unwrap();
        let chain = Chain::load_or_genesis(SnapshotStore::new(dir.path())).unwrap();

        seal(&chain, "F1", "B2", "Wheat", 10.0, 2200.0, "ORD-9").unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.pool().is_empty());

        let sealed = chain.last_block();
        assert_eq!(sealed.transactions.len(), 1);
        assert_eq!(sealed.transactions[0].crop, "INTEGRITY_SEAL: Wheat");
        assert_eq!(sealed.transactions[0].order_id.as_deref(), Some("ORD-9"));
        assert!(chain.validate());
    }

    #[test]
    fn test_digest_is_stable_across_calls() {
        let a = compute_digest("F1", "B2", "Wheat", 10.0, 2200.0, "ORD-9").unwrap();
        let b = compute_digest("F1", "B2", "Wheat", 10.0, 2200.0, "ORD-9").unwrap();
        assert_eq!(a, b);
    }
}
