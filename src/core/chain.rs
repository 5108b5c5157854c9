//! Ledger store: the append-only block sequence and its pending pool.
//!
//! # Invariants
//! - The chain is never empty after initialization; block 1 is genesis.
//! - `index` increases by exactly 1 per appended block.
//! - Every appended block links to the canonical digest of its predecessor
//!   and carries a proof valid against the predecessor's proof.
//! - A new block is persisted durably before it is committed in memory; a
//!   failed persistence aborts the append and restores the drained pool.
//!
//! # Concurrency
//! Single-writer discipline: a dedicated seal mutex serializes seal cycles
//! so the proof-of-work search never runs under the chain write lock and no
//! second seal can begin while one is in flight. Readers (`last_block`,
//! `validate`, `blocks`) see the last fully-committed state.

use std::sync::{Mutex, RwLock};

use tracing::{info, warn};

use crate::core::block::Block;
use crate::core::pool::TxPool;
use crate::core::pow;
use crate::core::transaction::Transaction;
use crate::error::Result;
use crate::hashing::hash_canonical;
use crate::persistence::SnapshotStore;

/// Ordered, append-only sequence of blocks plus the pending pool.
#[derive(Debug)]
pub struct Chain {
    blocks: RwLock<Vec<Block>>,
    pool: TxPool,
    store: SnapshotStore,
    /// Serializes seal cycles and next-index reporting; never held across
    /// reader operations.
    seal_guard: Mutex<()>,
}

impl Chain {
    /// Loads the persisted chain from `store`, falling back to a fresh
    /// genesis block on a missing or corrupt snapshot. The genesis chain is
    /// persisted immediately so a restart sees the same ledger.
    pub fn load_or_genesis(store: SnapshotStore) -> Result<Self> {
        let blocks = match store.load_chain() {
            Some(blocks) if !blocks.is_empty() => {
                info!(blocks = blocks.len(), "ledger loaded from snapshot");
                blocks
            }
            _ => {
                let genesis = vec![Block::genesis()];
                store.save_chain(&genesis)?;
                info!("no usable snapshot, genesis block created");
                genesis
            }
        };
        Ok(Self {
            blocks: RwLock::new(blocks),
            pool: TxPool::new(),
            store,
            seal_guard: Mutex::new(()),
        })
    }

    /// Buffers a trade record for inclusion in the next sealed block and
    /// returns the index that block will carry. Not persisted here;
    /// persistence happens at seal time.
    ///
    /// The push and the index read happen under the seal mutex: a push
    /// landing between a seal's pool drain and its block commit would
    /// otherwise be reported for a block one earlier than the one that
    /// actually contains it.
    pub fn add_transaction(&self, tx: Transaction) -> u64 {
        let _cycle = self.seal_guard.lock().unwrap();
        self.pool.push(tx);
        self.last_block().index + 1
    }

    /// Returns the most recently committed block.
    pub fn last_block(&self) -> Block {
        let blocks = self.blocks.read().unwrap();
        blocks
            .last()
            .cloned()
            .expect("chain contains at least the genesis block")
    }

    /// Runs one full seal cycle: solve proof-of-work against the last
    /// block's proof, link to its digest, and append a block containing the
    /// drained pool. The proof-of-work search runs outside the chain write
    /// lock; the seal mutex keeps cycles from interleaving.
    pub fn seal_block(&self) -> Result<Block> {
        let _cycle = self.seal_guard.lock().unwrap();
        let last = self.last_block();
        let proof = pow::solve(last.proof);
        let previous_hash = hash_canonical(&last)?;
        self.append_block(proof, previous_hash)
    }

    /// Appends a block built from the given proof, the supplied previous
    /// hash, and the entire pending pool (consumed atomically). The chain
    /// snapshot is persisted before the block is committed in memory.
    pub fn append_block(&self, proof: u64, previous_hash: String) -> Result<Block> {
        let batch = self.pool.drain_all();
        let mut blocks = self.blocks.write().unwrap();
        let index = blocks.last().map(|b| b.index).unwrap_or(0) + 1;
        let block = Block::new(index, batch, proof, previous_hash);

        let mut snapshot = blocks.clone();
        snapshot.push(block.clone());
        if let Err(e) = self.store.save_chain(&snapshot) {
            drop(blocks);
            warn!(index, error = %e, "seal aborted, pending pool restored");
            self.pool.restore(block.transactions);
            return Err(e);
        }

        blocks.push(block.clone());
        info!(
            index,
            transactions = block.transactions.len(),
            proof,
            "block sealed"
        );
        Ok(block)
    }

    /// Full-chain validation: for every block after genesis, checks that
    /// `previous_hash` matches the canonical digest of the prior block and
    /// that the proof-of-work predicate holds between consecutive proofs.
    /// Returns false on the first violation; never attempts repair.
    pub fn validate(&self) -> bool {
        let blocks = self.blocks.read().unwrap();
        for pair in blocks.windows(2) {
            let (prior, current) = (&pair[0], &pair[1]);
            match hash_canonical(prior) {
                Ok(digest) if current.previous_hash == digest => {}
                _ => return false,
            }
            if !pow::check(prior.proof, current.proof) {
                return false;
            }
        }
        true
    }

    /// Linear scan for the block whose canonical digest equals `digest`.
    pub fn find_block_by_hash(&self, digest: &str) -> Option<Block> {
        let blocks = self.blocks.read().unwrap();
        blocks
            .iter()
            .find(|b| hash_canonical(b).map(|h| h == digest).unwrap_or(false))
            .cloned()
    }

    /// Returns a copy of the committed block sequence.
    pub fn blocks(&self) -> Vec<Block> {
        self.blocks.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.blocks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        // Never true after initialization; kept for completeness.
        self.blocks.read().unwrap().is_empty()
    }

    /// The pending pool, for inspection.
    pub fn pool(&self) -> &TxPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
    use tempfile::TempDir;

    fn fresh_chain(dir: &TempDir) -> Chain {
        Chain::load_or_genesis(SnapshotStore::new(dir.path())).unwrap()
    }

    #[test]
    fn test_genesis_on_fresh_store() {
        let dir = TempDir::new().unwrap();
        let chain = fresh_chain(&dir);
        let genesis = chain.last_block();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, GENESIS_PROOF);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(chain.validate());
    }

    #[test]
    fn test_add_transaction_returns_next_index() {
        let dir = TempDir::new().unwrap();
        let chain = fresh_chain(&dir);
        let tx = Transaction::trade("F1", "B1", "Onion", 50.0, 2400.0, None);
        assert_eq!(chain.add_transaction(tx), 2);
        assert_eq!(chain.pool().len(), 1);
    }

    #[test]
    fn test_seal_drains_pool_and_links_blocks() {
        let dir = TempDir::new().unwrap();
        let chain = fresh_chain(&dir);
        chain.add_transaction(Transaction::trade("F1", "B1", "Onion", 50.0, 2400.0, None));
        chain.add_transaction(Transaction::trade("F2", "B1", "Wheat", 10.0, 2200.0, None));

        let sealed = chain.seal_block().unwrap();
        assert_eq!(sealed.index, 2);
        assert_eq!(sealed.transactions.len(), 2);
        assert_eq!(sealed.transactions[0].farmer_id, "F1");
        assert!(chain.pool().is_empty());

        let genesis = &chain.blocks()[0];
        assert_eq!(sealed.previous_hash, hash_canonical(genesis).unwrap());
        assert!(pow::check(genesis.proof, sealed.proof));
        assert!(chain.validate());
    }

    #[test]
    fn test_validate_detects_tampered_transaction() {
        let dir = TempDir::new().unwrap();
        let chain = fresh_chain(&dir);
        chain.add_transaction(Transaction::trade("F1", "B1", "Onion", 50.0, 2400.0, None));
        chain.seal_block().unwrap();
        chain.seal_block().unwrap();
        assert!(chain.validate());

        // Splice a modified price into a committed block.
        {
            let mut blocks = chain.blocks.write().unwrap();
            blocks[1].transactions[0].price_label = "Rs.9999".to_string();
        }
        assert!(!chain.validate());
    }

    #[test]
    fn test_validate_detects_bad_proof() {
        let dir = TempDir::new().unwrap();
        let chain = fresh_chain(&dir);
        chain.seal_block().unwrap();
        {
            let mut blocks = chain.blocks.write().unwrap();
            blocks[1].proof += 1;
        }
        assert!(!chain.validate());
    }

    #[test]
    fn test_restart_restores_committed_chain() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let sealed = {
            let chain = Chain::load_or_genesis(store.clone()).unwrap();
            chain.add_transaction(Transaction::trade("F1", "B1", "Onion", 50.0, 2400.0, None));
            chain.seal_block().unwrap()
        };

        let reloaded = Chain::load_or_genesis(store).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.last_block(), sealed);
        assert!(reloaded.validate());
    }

    #[test]
    fn test_reported_index_matches_containing_block_under_concurrent_seals() {
        let dir = TempDir::new().unwrap();
        let chain = fresh_chain(&dir);

        let mut reported = Vec::new();
        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..3 {
                    chain.seal_block().unwrap();
                }
            });
            for i in 0..5 {
                let tx = Transaction::trade(&format!("F{}", i), "B1", "Onion", 1.0, 10.0, None);
                reported.push((format!("F{}", i), chain.add_transaction(tx)));
            }
        });
        // Seal whatever is still pending so every submission is committed.
        if !chain.pool().is_empty() {
            chain.seal_block().unwrap();
        }

        let blocks = chain.blocks();
        for (farmer, index) in reported {
            let block = blocks
                .iter()
                .find(|b| b.index == index)
                .unwrap_or_else(|| panic!("no block with reported index {}", index));
            assert!(
                block.transactions.iter().any(|t| t.farmer_id == farmer),
                "{} reported for block {} but not contained in it",
                farmer,
                index
            );
        }
        assert!(chain.validate());
    }

    #[test]
    fn test_find_block_by_hash() {
        let dir = TempDir::new().unwrap();
        let chain = fresh_chain(&dir);
        let sealed = chain.seal_block().unwrap();
        let digest = hash_canonical(&sealed).unwrap();
        assert_eq!(chain.find_block_by_hash(&digest), Some(sealed));
        assert_eq!(chain.find_block_by_hash("no-such-digest"), None);
    }
}
