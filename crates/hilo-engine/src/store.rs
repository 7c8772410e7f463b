//! Snapshot persistence.
//!
//! The engine calls [`StateStore::save`] once per successful mutating
//! command, synchronously, and [`StateStore::load`] once at startup.
//!
//! [`JsonFileStore`] writes an envelope around the state:
//! ```text
//! { "version": 1, "checksum": "<sha256 hex of the state body>", "state": { .. } }
//! ```
//! The checksum is computed over the compact JSON of the state with
//! object keys in sorted order, so it does not depend on formatting.

use std::fs;
use std::path::{Path, PathBuf};

use hilo_types::{HiloError, Result, constants};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::state::EngineState;

/// Load/save seam between the engine and wherever snapshots live.
pub trait StateStore {
    /// The last saved state, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<EngineState>>;

    fn save(&mut self, state: &EngineState) -> Result<()>;
}

/// In-process store; keeps the last saved state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<EngineState>,
    saves: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded with `state`, as if it had been saved earlier.
    #[must_use]
    pub fn with_state(state: EngineState) -> Self {
        Self {
            snapshot: Some(state),
            saves: 0,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&EngineState> {
        self.snapshot.as_ref()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn saves(&self) -> u64 {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<EngineState>> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, state: &EngineState) -> Result<()> {
        self.snapshot = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    checksum: String,
    state: serde_json::Value,
}

/// JSON file store with atomic replace.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn checksum(body: &serde_json::Value) -> String {
    hex::encode(Sha256::digest(body.to_string().as_bytes()))
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<EngineState>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let envelope: Envelope = serde_json::from_str(&raw)?;
        if envelope.version != constants::SNAPSHOT_VERSION {
            return Err(HiloError::Serialization(format!(
                "snapshot {} has version {}, expected {}",
                self.path.display(),
                envelope.version,
                constants::SNAPSHOT_VERSION
            )));
        }
        let actual = checksum(&envelope.state);
        if actual != envelope.checksum {
            return Err(HiloError::Serialization(format!(
                "snapshot {} checksum mismatch: recorded {}, computed {actual}",
                self.path.display(),
                envelope.checksum
            )));
        }
        let state = serde_json::from_value(envelope.state)?;
        tracing::info!(path = %self.path.display(), checksum = %actual, "Snapshot loaded");
        Ok(Some(state))
    }

    fn save(&mut self, state: &EngineState) -> Result<()> {
        let body = serde_json::to_value(state)?;
        let envelope = Envelope {
            version: constants::SNAPSHOT_VERSION,
            checksum: checksum(&body),
            state: body,
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        tracing::debug!(path = %self.path.display(), checksum = %envelope.checksum, "Snapshot saved");
        Ok(())
    }
}
