//! On-disk state file.
//!
//! The file is a bincode-encoded envelope holding a format version, the
//! Blake2b-256 checksum of the payload, and the payload itself. Writes go
//! to a sibling temp file which is then renamed over the target, so a crash
//! mid-write leaves the previous state intact.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use poap_access::RoleAssignments;
use poap_crypto::blake2b_256;
use poap_registry::LedgerSnapshot;
use poap_store::MemoryTokenLedger;

use crate::NodeError;

/// Current state file format.
pub const STATE_FILE_VERSION: u32 = 1;

/// Everything a node needs to come back up where it left off.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedState {
    pub ledger: LedgerSnapshot,
    pub tokens: MemoryTokenLedger,
    pub roles: RoleAssignments,
}

#[derive(Serialize, Deserialize)]
struct StateFile {
    version: u32,
    checksum: [u8; 32],
    payload: Vec<u8>,
}

/// Write `state` to `path`, replacing any previous file.
pub fn save_state(path: &Path, state: &PersistedState) -> Result<(), NodeError> {
    let payload = bincode::serialize(state)?;
    let file = StateFile {
        version: STATE_FILE_VERSION,
        checksum: blake2b_256(&payload),
        payload,
    };
    let bytes = bincode::serialize(&file)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "state saved");
    Ok(())
}

/// Read the state file at `path`. A missing file yields `None`.
pub fn load_state(path: &Path) -> Result<Option<PersistedState>, NodeError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let file: StateFile = bincode::deserialize(&bytes)?;
    if file.version != STATE_FILE_VERSION {
        return Err(NodeError::Persistence(format!(
            "unsupported state file version {}",
            file.version
        )));
    }
    if blake2b_256(&file.payload) != file.checksum {
        return Err(NodeError::Persistence("checksum mismatch".into()));
    }

    let mut state: PersistedState = bincode::deserialize(&file.payload)?;
    state.tokens.reindex();
    debug!(path = %path.display(), "state loaded");
    Ok(Some(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use poap_access::RoleTable;
    use poap_store::TokenLedger;
    use poap_types::{Address, CredentialId};
    use std::sync::Arc;

    fn sample_state() -> PersistedState {
        let ledger = poap_registry::PoapLedger::new(
            RoleTable::new(),
            MemoryTokenLedger::new(),
            Arc::new(poap_types::FixedClock(poap_types::Timestamp::new(0))),
        );
        let mut tokens = MemoryTokenLedger::new();
        tokens.bind(CredentialId::FIRST, Address::new([4; 20])).unwrap();
        PersistedState {
            ledger: ledger.snapshot(),
            tokens,
            roles: RoleTable::with_admin(Address::new([1; 20])).assignments(),
        }
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_state(&dir.path().join("absent.bin")).unwrap().is_none());
    }

    #[test]
    fn save_then_load_restores_balances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.bin");
        save_state(&path, &sample_state()).unwrap();

        let loaded = load_state(&path).unwrap().unwrap();
        assert_eq!(loaded.tokens.balance_of(&Address::new([4; 20])), 1);
        assert_eq!(loaded.roles, sample_state().roles);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        save_state(&path, &sample_state()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(load_state(&path), Err(NodeError::Persistence(_))));
    }
}
