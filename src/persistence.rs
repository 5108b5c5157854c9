//! Durable snapshots of the chain and the contract map.
//!
//! Each artifact is written as a complete replacement of the prior durable
//! copy: serialize to a `.tmp` sibling, flush, then rename into place, so a
//! crash mid-write can never leave a file that parses successfully but
//! misrepresents the last committed state. Loading tolerates missing or
//! corrupt files; callers fall back to genesis / an empty contract map.

use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::block::Block;
use crate::core::escrow::Contract;
use crate::error::{LedgerError, Result};

/// Chain snapshot file name inside the data directory.
pub const CHAIN_FILE: &str = "trade_ledger.json";
/// Contract map snapshot file name inside the data directory.
pub const CONTRACTS_FILE: &str = "trade_ledger_contracts.json";

/// Handle to the two durable snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    chain_path: PathBuf,
    contracts_path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at `data_dir`. The directory is created on
    /// first save, not here.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let dir = data_dir.as_ref();
        Self {
            chain_path: dir.join(CHAIN_FILE),
            contracts_path: dir.join(CONTRACTS_FILE),
        }
    }

    pub fn chain_path(&self) -> &Path {
        &self.chain_path
    }

    pub fn contracts_path(&self) -> &Path {
        &self.contracts_path
    }

    /// Replaces the durable chain snapshot with `blocks`.
    pub fn save_chain(&self, blocks: &[Block]) -> Result<()> {
        write_atomic(&self.chain_path, blocks)?;
        debug!(blocks = blocks.len(), path = %self.chain_path.display(), "chain snapshot written");
        Ok(())
    }

    /// Replaces the durable contract snapshot with `contracts`.
    pub fn save_contracts(&self, contracts: &HashMap<String, Contract>) -> Result<()> {
        write_atomic(&self.contracts_path, contracts)?;
        debug!(
            contracts = contracts.len(),
            path = %self.contracts_path.display(),
            "contract snapshot written"
        );
        Ok(())
    }

    /// Loads the persisted chain. Returns `None` on a missing, unreadable,
    /// or unparsable file; the caller falls back to genesis creation.
    pub fn load_chain(&self) -> Option<Vec<Block>> {
        read_snapshot(&self.chain_path)
    }

    /// Loads the persisted contract map. Returns `None` on a missing,
    /// unreadable, or unparsable file; the caller starts empty.
    pub fn load_contracts(&self) -> Option<HashMap<String, Contract>> {
        read_snapshot(&self.contracts_path)
    }
}

/// Writes `value` as pretty JSON to `path` via a temp file and rename.
fn write_atomic<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    {
        let file = fs::File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| LedgerError::Persistence(format!("snapshot serialize failed: {}", e)))?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn read_snapshot<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "snapshot unreadable, starting fresh");
            }
            return None;
        }
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot corrupt, starting fresh");
            None
        }
    }
}
