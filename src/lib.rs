pub mod core;
pub mod error;
pub mod hashing;
pub mod persistence;

pub use error::{LedgerError, Result};
pub use hashing::{hash_bytes, hash_canonical};
pub use persistence::{SnapshotStore, CHAIN_FILE, CONTRACTS_FILE};

// Core API exports
pub use crate::core::block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP};
pub use crate::core::chain::Chain;
pub use crate::core::escrow::{Contract, ContractStatus, EscrowManager};
pub use crate::core::integrity::VerifyReport;
pub use crate::core::pool::TxPool;
pub use crate::core::pow::{check, solve, solve_cancellable, DIFFICULTY_PREFIX};
pub use crate::core::transaction::Transaction;
pub use crate::core::{Core, LedgerConfig};
