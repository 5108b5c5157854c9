//! Proof-of-work engine.
//!
//! A deliberately expensive, sequential nonce search standing in for a
//! consensus delay on this single-writer ledger. The search is stateless
//! and restartable: `solve` is a pure function of `last_proof`, and
//! `check` recomputes the same predicate for validation.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::hashing::hash_bytes;

/// Required number of leading hexadecimal zero characters in the guess
/// digest. Fixed; difficulty is not adaptive.
pub const DIFFICULTY_PREFIX: usize = 4;

/// How many candidates to try between cancellation-flag checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

fn guess_digest(last_proof: u64, proof: u64) -> String {
    hash_bytes(format!("{}{}", last_proof, proof).as_bytes())
}

fn valid_with_difficulty(last_proof: u64, proof: u64, difficulty: usize) -> bool {
    guess_digest(last_proof, proof)
        .as_bytes()
        .iter()
        .take(difficulty)
        .all(|&b| b == b'0')
}

/// Tests whether `proof` is a valid successor to `last_proof`.
pub fn check(last_proof: u64, proof: u64) -> bool {
    valid_with_difficulty(last_proof, proof, DIFFICULTY_PREFIX)
}

/// Searches candidates `0, 1, 2, ...` until one satisfies the difficulty
/// predicate against `last_proof`. Deterministic: the same `last_proof`
/// always yields the same solution.
pub fn solve(last_proof: u64) -> u64 {
    solve_with_difficulty(last_proof, DIFFICULTY_PREFIX)
}

pub(crate) fn solve_with_difficulty(last_proof: u64, difficulty: usize) -> u64 {
    let mut proof = 0u64;
    while !valid_with_difficulty(last_proof, proof, difficulty) {
        proof += 1;
    }
    proof
}

/// Like [`solve`], but returns `None` once `cancel` is observed set.
///
/// The flag is polled every [`CANCEL_CHECK_INTERVAL`] candidates so an
/// enclosing service can abandon a search on request timeout without
/// affecting correctness of completed seals.
pub fn solve_cancellable(last_proof: u64, cancel: &AtomicBool) -> Option<u64> {
    let mut proof = 0u64;
    loop {
        if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return None;
        }
        if valid_with_difficulty(last_proof, proof, DIFFICULTY_PREFIX) {
            return Some(proof);
        }
        proof += 1;
    }
}
