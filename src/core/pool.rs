//! Transaction pool: FIFO buffer of pending trade records awaiting
//! inclusion in the next sealed block.
//!
//! # Invariants
//! - Arrival order is preserved; ordering within a sealed block reflects
//!   submission order.
//! - Draining is atomic: a seal either takes the whole buffer or none of it.

use std::sync::RwLock;

use crate::core::transaction::Transaction;

/// Thread-safe FIFO buffer of pending transactions.
#[derive(Debug, Default)]
pub struct TxPool {
    pending: RwLock<Vec<Transaction>>,
}

impl TxPool {
    pub fn new() -> Self {
        Self {
            pending: RwLock::new(Vec::new()),
        }
    }

    /// Appends a transaction at the tail of the buffer.
    pub fn push(&self, tx: Transaction) {
        let mut pending = self.pending.write().unwrap();
        pending.push(tx);
    }

    /// Takes the entire buffer in arrival order, leaving it empty.
    pub fn drain_all(&self) -> Vec<Transaction> {
        let mut pending = self.pending.write().unwrap();
        std::mem::take(&mut *pending)
    }

    /// Puts a previously drained batch back at the head of the buffer.
    /// Used when a seal aborts after draining (e.g. persistence failure),
    /// so no submitted transaction is lost.
    pub fn restore(&self, mut batch: Vec<Transaction>) {
        let mut pending = self.pending.write().unwrap();
        batch.append(&mut pending);
        *pending = batch;
    }

    /// Returns a copy of the pending transactions in arrival order.
    pub fn pending(&self) -> Vec<Transaction> {
        self.pending.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.pending.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.read().unwrap().is_empty()
    }
}
