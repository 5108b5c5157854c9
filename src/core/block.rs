//! Block structure and genesis constants.
//!
//! # Invariants
//! - `index` increases by exactly 1 per block, starting at 1 for genesis.
//! - `previous_hash` is the canonical digest of the immediately preceding
//!   block, or the `GENESIS_PREVIOUS_HASH` sentinel for genesis.
//! - `proof` satisfies the proof-of-work predicate against the previous
//!   block's proof.

use serde::{Deserialize, Serialize};

use crate::core::transaction::{now_f64, Transaction};

/// Sentinel `previous_hash` for the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Fixed starting proof for the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Fixed genesis timestamp. Together with the fixed proof and sentinel
/// previous hash, every fresh deployment begins from an identical,
/// reproducible genesis digest.
pub const GENESIS_TIMESTAMP: f64 = 0.0;

/// A batch of transactions sealed together with a proof and a link to the
/// previous block's digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Builds the block that follows `index - 1` with the given sealed
    /// transaction batch.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: now_f64(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Builds the genesis block: index 1, no transactions, fixed proof,
    /// timestamp, and sentinel previous hash.
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp: GENESIS_TIMESTAMP,
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }
}
