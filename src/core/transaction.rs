//! Trade record format for the ledger.
//!
//! Quantity and price are recorded as display-formatted label strings
//! (`"50 Quintals"`, `"Rs.2400"`) carrying the original numeric value plus
//! unit annotation; they are never re-parsed once included in a block.
//! Escrow lifecycle events and integrity seals are logged as synthetic
//! transactions whose crop field carries an event label
//! (`"DISPATCHED: <crop>"`, `"RELEASED: <crop>"`, `"INTEGRITY_SEAL: <crop>"`).

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current unix time as fractional seconds.
pub(crate) fn now_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A single trade record. Immutable once included in a block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub farmer_id: String,
    pub buyer_id: String,
    pub crop: String,
    /// Quantity with unit annotation, e.g. `"50 Quintals"`.
    pub quantity_label: String,
    /// Price with currency annotation, e.g. `"Rs.2400"`.
    pub price_label: String,
    pub order_id: Option<String>,
    pub timestamp: f64,
}

impl Transaction {
    /// Builds a trade record with formatted quantity and price labels.
    pub fn trade(
        farmer_id: &str,
        buyer_id: &str,
        crop: &str,
        quantity: f64,
        price: f64,
        order_id: Option<String>,
    ) -> Self {
        Self {
            farmer_id: farmer_id.to_string(),
            buyer_id: buyer_id.to_string(),
            crop: crop.to_string(),
            quantity_label: format!("{} Quintals", quantity),
            price_label: format!("Rs.{}", price),
            order_id,
            timestamp: now_f64(),
        }
    }

    /// Zero-value marker logged when an escrow contract is dispatched.
    pub fn dispatch_marker(farmer_id: &str, buyer_id: &str, crop: &str) -> Self {
        Self::trade(
            farmer_id,
            buyer_id,
            &format!("DISPATCHED: {}", crop),
            0.0,
            0.0,
            None,
        )
    }

    /// Marker logged when escrow payment is released; carries the full
    /// contract price so the audit trail shows the amount that moved.
    pub fn release_marker(farmer_id: &str, buyer_id: &str, crop: &str, price: f64) -> Self {
        Self::trade(
            farmer_id,
            buyer_id,
            &format!("RELEASED: {}", crop),
            0.0,
            price,
            None,
        )
    }

    /// Marker logged when an integrity seal is anchored into the chain.
    pub fn integrity_marker(
        farmer_id: &str,
        buyer_id: &str,
        crop: &str,
        quantity: f64,
        price: f64,
        order_id: &str,
    ) -> Self {
        Self::trade(
            farmer_id,
            buyer_id,
            &format!("INTEGRITY_SEAL: {}", crop),
            quantity,
            price,
            Some(order_id.to_string()),
        )
    }
}
