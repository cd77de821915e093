//! Unified error types for the form state engine.
//!
//! Path and action errors are local and leave the form untouched.
//! [`FormError::StructuralInconsistency`] is the exception: it signals a
//! defect in the caller (or in the engine) and should be surfaced to the host
//! application, never shown to the person editing the document.
//!
//! Validation failures are not errors. They are data, carried by
//! [`crate::Validity::Invalid`].

use thiserror::Error;

use crate::path::Path;

/// Unified error type for all form state operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormError {
    /// A path string violates the path syntax.
    #[error("Malformed path '{path}': {reason}")]
    MalformedPath {
        /// The raw path as given by the caller.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An action referenced a path that is absent from the form.
    #[error("Unknown path: {path}")]
    UnknownPath {
        /// The path that was not found.
        path: Path,
    },

    /// An action would break a structural invariant of the form tree.
    #[error("Structural inconsistency: {message}")]
    StructuralInconsistency {
        /// Description of the violated invariant.
        message: String,
    },

    /// A field value cannot be represented on the wire.
    #[error("Field '{path}' is not transmissible: {reason}")]
    Serialization {
        /// Path of the offending field.
        path: String,
        /// Why the value cannot cross the boundary.
        reason: String,
    },

    /// A capability registration conflicts with an earlier one.
    #[error("Registry error for '{shape}': {message}")]
    Registry {
        /// Structural shape being registered.
        shape: String,
        /// Description of the conflict.
        message: String,
    },

    /// Submission was blocked because visible fields are not valid.
    #[error("Form is not valid: {} field(s) block submission", invalid.len())]
    FormInvalid {
        /// Paths of the visible fields that are not `valid`.
        invalid: Vec<Path>,
    },
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

impl FormError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown(path: &Path) -> Self {
        Self::UnknownPath { path: path.clone() }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::StructuralInconsistency {
            message: message.into(),
        }
    }

    /// True for programming errors that must be escalated as defects.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::StructuralInconsistency { .. })
    }

    /// Check if this error is recoverable (caller can fix and retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedPath { .. }
                | Self::UnknownPath { .. }
                | Self::Registry { .. }
                | Self::FormInvalid { .. }
        )
    }

    /// Get a suggestion for fixing this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MalformedPath { .. } => Some(
                "Paths are named segments joined by '.', with zero-based row indices (tags.0.value).",
            ),
            Self::UnknownPath { .. } => {
                Some("The field may have been removed by a row operation; re-read the form state.")
            }
            Self::Registry { .. } => {
                Some("Declare each shape once, and declare parents before their children.")
            }
            Self::FormInvalid { .. } => {
                Some("Fix the fields reporting validation errors, then submit again.")
            }
            Self::StructuralInconsistency { .. } | Self::Serialization { .. } => None,
        }
    }
}
