//! Ledger core: the facade an enclosing service consumes.
//!
//! [`Core`] owns the chain (block sequence + pending pool) and the escrow
//! contract manager over one snapshot store, and orchestrates the flows
//! that touch both: every escrow lifecycle event is additionally logged as
//! a transaction into the pending pool, so the ledger carries a full audit
//! trail even though contract state lives in its own keyed store.
//!
//! # Invariants
//! - The chain and the contract map are mutated only through their own
//!   guarded operations; no caller splices either directly.
//! - A persistence failure aborts the mutating operation before any
//!   in-memory state is considered committed.

pub mod block;
pub mod chain;
pub mod escrow;
pub mod integrity;
pub mod pool;
pub mod pow;
pub mod transaction;

use std::path::PathBuf;

use crate::core::block::Block;
use crate::core::chain::Chain;
use crate::core::escrow::{Contract, EscrowManager};
use crate::core::integrity::VerifyReport;
use crate::core::transaction::Transaction;
use crate::error::Result;
use crate::hashing::hash_canonical;
use crate::persistence::SnapshotStore;

/// Construction-time configuration for a [`Core`].
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Directory holding the two snapshot files.
    pub data_dir: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Owned handle to the ledger and escrow stores. Created once at process
/// start, lives for the process lifetime.
#[derive(Debug)]
pub struct Core {
    chain: Chain,
    escrow: EscrowManager,
}

impl Core {
    /// Opens the ledger at the configured data directory: loads persisted
    /// snapshots or seeds a genesis chain and an empty contract map.
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        let store = SnapshotStore::new(&config.data_dir);
        let chain = Chain::load_or_genesis(store.clone())?;
        let escrow = EscrowManager::load(store);
        Ok(Self { chain, escrow })
    }

    /// Buffers a trade record for the next sealed block; returns the index
    /// of the block that will contain it.
    pub fn add_transaction(
        &self,
        farmer_id: &str,
        buyer_id: &str,
        crop: &str,
        quantity: f64,
        price: f64,
        order_id: Option<String>,
    ) -> u64 {
        self.chain.add_transaction(Transaction::trade(
            farmer_id, buyer_id, crop, quantity, price, order_id,
        ))
    }

    /// Solves proof-of-work against the current last block and appends a
    /// block containing the drained pool.
    pub fn seal_block(&self) -> Result<Block> {
        self.chain.seal_block()
    }

    /// Canonical digest of a block.
    pub fn hash_block(&self, block: &Block) -> Result<String> {
        hash_canonical(block)
    }

    /// Full-chain validation scan.
    pub fn validate_chain(&self) -> bool {
        self.chain.validate()
    }

    /// Computes and durably anchors an integrity seal for a trade.
    pub fn seal_integrity(
        &self,
        farmer_id: &str,
        buyer_id: &str,
        crop: &str,
        quantity: f64,
        price: f64,
        order_id: &str,
    ) -> Result<String> {
        integrity::seal(
            &self.chain,
            farmer_id,
            buyer_id,
            crop,
            quantity,
            price,
            order_id,
        )
    }

    /// Recomputes an integrity digest and reports tampering. Pure.
    pub fn verify_integrity(
        &self,
        farmer_id: &str,
        buyer_id: &str,
        crop: &str,
        quantity: f64,
        price: f64,
        order_id: &str,
        stored_digest: &str,
    ) -> Result<VerifyReport> {
        integrity::verify(
            farmer_id,
            buyer_id,
            crop,
            quantity,
            price,
            order_id,
            stored_digest,
        )
    }

    /// Creates a LOCKED escrow contract and logs the trade into the
    /// pending pool. Does not force a seal.
    pub fn initiate_contract(
        &self,
        farmer_id: &str,
        buyer_id: &str,
        crop: &str,
        quantity: f64,
        price: f64,
    ) -> Result<Contract> {
        let contract = self
            .escrow
            .initiate(farmer_id, buyer_id, crop, quantity, price)?;
        self.chain.add_transaction(Transaction::trade(
            farmer_id, buyer_id, crop, quantity, price, None,
        ));
        Ok(contract)
    }

    /// LOCKED -> DISPATCHED, with a zero-value marker logged to the pool.
    pub fn dispatch(&self, contract_id: &str) -> Result<Contract> {
        let contract = self.escrow.dispatch(contract_id)?;
        self.chain.add_transaction(Transaction::dispatch_marker(
            &contract.farmer_id,
            &contract.buyer_id,
            &contract.crop,
        ));
        Ok(contract)
    }

    /// DISPATCHED -> RELEASED, with a marker carrying the full contract
    /// price logged to the pool.
    pub fn confirm(&self, contract_id: &str) -> Result<Contract> {
        let contract = self.escrow.confirm(contract_id)?;
        self.chain.add_transaction(Transaction::release_marker(
            &contract.farmer_id,
            &contract.buyer_id,
            &contract.crop,
            contract.price,
        ));
        Ok(contract)
    }

    /// Pure read of a contract by id.
    pub fn get_contract(&self, contract_id: &str) -> Result<Contract> {
        self.escrow.get(contract_id)
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn escrow(&self) -> &EscrowManager {
        &self.escrow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::escrow::ContractStatus;
    use tempfile::TempDir;

    fn open_core(dir: &TempDir) -> Core {
        Core::open(&LedgerConfig {
            data_dir: dir.path().to_path_buf(),
        })
        .unwrap()
    }

    #[test]
    fn test_open_seeds_genesis() {
        let dir = TempDir::new().unwrap();
        let core = open_core(&dir);
        assert_eq!(core.chain().len(), 1);
        assert!(core.validate_chain());
        assert!(core.escrow().is_empty());
    }

    #[test]
    fn test_add_transaction_reports_next_index() {
        let dir = TempDir::new().unwrap();
        let core = open_core(&dir);
        let idx = core.add_transaction("F1", "B1", "Onion", 50.0, 2400.0, None);
        assert_eq!(idx, 2);
        let sealed = core.seal_block().unwrap();
        assert_eq!(sealed.index, idx);
    }

    #[test]
    fn test_escrow_events_logged_to_pool() {
        let dir = TempDir::new().unwrap();
        let core = open_core(&dir);
        let contract = core
            .initiate_contract("F1", "B1", "Onion", 50.0, 2400.0)
            .unwrap();
        core.dispatch(&contract.id).unwrap();
        core.confirm(&contract.id).unwrap();

        let pending = core.chain().pool().pending();
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].crop, "Onion");
        assert_eq!(pending[1].crop, "DISPATCHED: Onion");
        assert_eq!(pending[2].crop, "RELEASED: Onion");
        assert_eq!(pending[2].price_label, "Rs.2400");

        let released = core.get_contract(&contract.id).unwrap();
        assert_eq!(released.status, ContractStatus::Released);
    }

    #[test]
    fn test_failed_transition_logs_nothing() {
        let dir = TempDir::new().unwrap();
        let core = open_core(&dir);
        let contract = core
            .initiate_contract("F1", "B1", "Onion", 50.0, 2400.0)
            .unwrap();
        let before = core.chain().pool().len();
        assert!(core.confirm(&contract.id).is_err());
        assert_eq!(core.chain().pool().len(), before);
    }

    #[test]
    fn test_hash_block_matches_chain_linkage() {
        let dir = TempDir::new().unwrap();
        let core = open_core(&dir);
        let genesis = core.chain().last_block();
        let sealed = core.seal_block().unwrap();
        assert_eq!(sealed.previous_hash, core.hash_block(&genesis).unwrap());
    }
}
