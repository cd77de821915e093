//! Snapshot error types.

use std::path::PathBuf;

use form_model::FormError;
use thiserror::Error;

/// Error while saving or loading a step snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not a step snapshot.
    #[error("Invalid snapshot file {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    /// Written by a newer format version.
    #[error("Snapshot version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    /// The stored state does not match its checksum.
    #[error("Snapshot {path} is corrupted (checksum mismatch)")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Snapshot JSON could not be produced or parsed.
    #[error("Failed to encode or decode snapshot {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The temp file could not be renamed over the target.
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot loaded but its state could not be rebuilt.
    #[error(transparent)]
    Form(#[from] FormError),
}

impl SnapshotError {
    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::InvalidFormat { .. } => Some("Make sure you selected a form step snapshot.".into()),
            Self::UnsupportedVersion { .. } => Some("Update to a newer release to open this snapshot.".into()),
            Self::ChecksumMismatch { .. } | Self::Json { .. } => {
                Some("Restart the step from the previous snapshot if you have one.".into())
            }
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
            Self::Form(err) => err.suggestion().map(str::to_string),
        }
    }
}

/// Result type alias for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;
