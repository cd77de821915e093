//! Step snapshots for multi-step flows.
//!
//! A snapshot is a JSON file holding one serialized form state between two
//! steps:
//!
//! ```text
//! {
//!   "magic": "form-step",
//!   "version": 1,
//!   "step": "shipping",
//!   "savedAt": "2026-10-16T09:30:00Z",
//!   "checksum": "<sha-256 of the compact state JSON>",
//!   "state": { ...wire format... }
//! }
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use form_state::{CapabilityRegistry, FormState};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::boundary::deserialize;
use crate::error::{Result, SnapshotError};
use crate::wire::SerializedState;

/// Identifies a step snapshot file.
pub const SNAPSHOT_MAGIC: &str = "form-step";

/// Current snapshot format version.
///
/// The loader rejects files with a version above this one.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One serialized form state saved between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSnapshot {
    /// Name of the step that produced the state.
    pub step: String,
    pub saved_at: DateTime<Utc>,
    pub state: SerializedState,
}

impl StepSnapshot {
    pub fn new(step: impl Into<String>, state: SerializedState) -> Self {
        Self {
            step: step.into(),
            saved_at: Utc::now(),
            state,
        }
    }

    /// Update the saved timestamp.
    pub fn touch(&mut self) {
        self.saved_at = Utc::now();
    }

    /// Rebuild the live state, taking capabilities from `registry`.
    pub fn restore(&self, registry: Arc<CapabilityRegistry>) -> Result<FormState> {
        Ok(deserialize(&self.state, registry)?)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    magic: String,
    version: u32,
    step: String,
    saved_at: DateTime<Utc>,
    checksum: String,
    state: SerializedState,
}

/// Header fields, read before the rest of the file is trusted.
#[derive(Deserialize)]
struct SnapshotHeader {
    magic: Option<String>,
    version: Option<u32>,
}

fn checksum(state: &SerializedState, path: &Path) -> Result<String> {
    let bytes = serde_json::to_vec(state).map_err(|e| SnapshotError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Save a snapshot.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a half
/// written snapshot behind.
pub fn save_snapshot(snapshot: &mut StepSnapshot, path: &Path) -> Result<()> {
    snapshot.touch();

    let file = SnapshotFile {
        magic: SNAPSHOT_MAGIC.to_string(),
        version: SNAPSHOT_VERSION,
        step: snapshot.step.clone(),
        saved_at: snapshot.saved_at,
        checksum: checksum(&snapshot.state, path)?,
        state: snapshot.state.clone(),
    };
    let bytes = serde_json::to_vec_pretty(&file).map_err(|e| SnapshotError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;

    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SnapshotError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut out = File::create(&temp_path).map_err(|e| SnapshotError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    out.write_all(&bytes).map_err(|e| SnapshotError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    out.sync_all().map_err(|e| SnapshotError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| SnapshotError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(step = %snapshot.step, fields = snapshot.state.len(), "Saved step snapshot to {}", path.display());
    Ok(())
}

/// Load a snapshot and verify its checksum.
pub fn load_snapshot(path: &Path) -> Result<StepSnapshot> {
    let bytes = fs::read(path).map_err(|e| SnapshotError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;

    let header: SnapshotHeader = serde_json::from_slice(&bytes).map_err(|e| SnapshotError::InvalidFormat {
        path: path.to_path_buf(),
        reason: format!("not a JSON document: {e}"),
    })?;
    if header.magic.as_deref() != Some(SNAPSHOT_MAGIC) {
        return Err(SnapshotError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "Not a form step snapshot (missing or wrong magic)".to_string(),
        });
    }
    let version = header.version.unwrap_or_default();
    if version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: version,
            max_supported: SNAPSHOT_VERSION,
            path: path.to_path_buf(),
        });
    }

    let file: SnapshotFile = serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;

    let actual = checksum(&file.state, path)?;
    if actual != file.checksum {
        return Err(SnapshotError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: file.checksum,
            actual,
        });
    }

    tracing::info!(step = %file.step, fields = file.state.len(), "Loaded step snapshot from {}", path.display());
    Ok(StepSnapshot {
        step: file.step,
        saved_at: file.saved_at,
        state: file.state,
    })
}
