//! Escrow contract manager: a guarded finite-state machine per contract.
//!
//! State diagram: `LOCKED -> DISPATCHED -> RELEASED`. No transition skips a
//! state, no transition reverses, RELEASED is terminal. Contracts are never
//! deleted; terminal contracts are retained for audit.
//!
//! The contract map is persisted as a complete snapshot before any
//! in-memory commit, so a persistence failure leaves both memory and disk
//! on the prior committed state.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::transaction::now_f64;
use crate::error::{LedgerError, Result};
use crate::persistence::SnapshotStore;

/// Escrow lifecycle state. Transitions are monotone and one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Locked,
    Dispatched,
    Released,
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContractStatus::Locked => "LOCKED",
            ContractStatus::Dispatched => "DISPATCHED",
            ContractStatus::Released => "RELEASED",
        };
        f.write_str(s)
    }
}

/// An escrow contract governing conditional payment release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    /// Unique, immutable after creation; derived from creation time and a
    /// prefix of the farmer identifier.
    pub id: String,
    pub farmer_id: String,
    pub buyer_id: String,
    pub crop: String,
    /// Quantity with unit annotation, e.g. `"50 Quintals"`.
    pub quantity: String,
    pub price: f64,
    pub status: ContractStatus,
    pub created_at: f64,
    pub dispatched_at: Option<f64>,
    pub released_at: Option<f64>,
}

/// Keyed collection of contracts with guarded transitions.
#[derive(Debug)]
pub struct EscrowManager {
    contracts: RwLock<HashMap<String, Contract>>,
    store: SnapshotStore,
}

impl EscrowManager {
    /// Loads the persisted contract map from `store`, starting empty on a
    /// missing or unreadable snapshot.
    pub fn load(store: SnapshotStore) -> Self {
        let contracts = store.load_contracts().unwrap_or_default();
        if !contracts.is_empty() {
            info!(contracts = contracts.len(), "contracts loaded from snapshot");
        }
        Self {
            contracts: RwLock::new(contracts),
            store,
        }
    }

    /// Creates a new contract in LOCKED state and persists the updated map.
    pub fn initiate(
        &self,
        farmer_id: &str,
        buyer_id: &str,
        crop: &str,
        quantity: f64,
        price: f64,
    ) -> Result<Contract> {
        let mut contracts = self.contracts.write().unwrap();
        let id = Self::next_id(&contracts, farmer_id);
        let contract = Contract {
            id: id.clone(),
            farmer_id: farmer_id.to_string(),
            buyer_id: buyer_id.to_string(),
            crop: crop.to_string(),
            quantity: format!("{} Quintals", quantity),
            price,
            status: ContractStatus::Locked,
            created_at: now_f64(),
            dispatched_at: None,
            released_at: None,
        };

        let mut snapshot = contracts.clone();
        snapshot.insert(id.clone(), contract.clone());
        self.store.save_contracts(&snapshot)?;
        *contracts = snapshot;

        info!(contract = %id, crop, "escrow contract initiated");
        Ok(contract)
    }

    /// LOCKED -> DISPATCHED. Any other current state is an
    /// `InvalidTransition` carrying the current state in its detail.
    pub fn dispatch(&self, id: &str) -> Result<Contract> {
        self.transition(id, ContractStatus::Locked, |contract| {
            contract.status = ContractStatus::Dispatched;
        })
    }

    /// DISPATCHED -> RELEASED. Stamps `dispatched_at` and `released_at`
    /// both to the confirmation time.
    pub fn confirm(&self, id: &str) -> Result<Contract> {
        self.transition(id, ContractStatus::Dispatched, |contract| {
            let now = now_f64();
            contract.status = ContractStatus::Released;
            contract.dispatched_at = Some(now);
            contract.released_at = Some(now);
        })
    }

    /// Pure read of a contract by id.
    pub fn get(&self, id: &str) -> Result<Contract> {
        let contracts = self.contracts.read().unwrap();
        contracts
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Returns a copy of the full contract map.
    pub fn contracts(&self) -> HashMap<String, Contract> {
        self.contracts.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.contracts.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.read().unwrap().is_empty()
    }

    /// Applies a guarded transition: the contract must exist and be in
    /// `required` state. Persists the updated map before committing it.
    fn transition<F>(&self, id: &str, required: ContractStatus, apply: F) -> Result<Contract>
    where
        F: FnOnce(&mut Contract),
    {
        let mut contracts = self.contracts.write().unwrap();
        let current = contracts
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if current.status != required {
            return Err(LedgerError::InvalidTransition {
                current: current.status.to_string(),
                required: required.to_string(),
            });
        }

        let mut updated = current.clone();
        apply(&mut updated);

        let mut snapshot = contracts.clone();
        snapshot.insert(id.to_string(), updated.clone());
        self.store.save_contracts(&snapshot)?;
        *contracts = snapshot;

        info!(contract = %id, status = %updated.status, "escrow contract transitioned");
        Ok(updated)
    }

    /// Id format: `SC-<unix-secs>-<first 4 chars of farmer id>`, with a
    /// numeric suffix when two contracts land in the same second.
    fn next_id(contracts: &HashMap<String, Contract>, farmer_id: &str) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let prefix: String = farmer_id.chars().take(4).collect();
        let base = format!("SC-{}-{}", secs, prefix);
        if !contracts.contains_key(&base) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !contracts.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}
