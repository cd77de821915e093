//! Editing session configuration.

use serde::{Deserialize, Serialize};

/// Configuration for one editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Validate every field once the document is loaded.
    pub validate_on_load: bool,

    /// Validate fields as their values change.
    ///
    /// When off, fields stay `unvalidated` until `validate_all` or submit.
    pub validate_on_change: bool,

    /// Seed for minting row identities. Fixed seeds make row actions
    /// replayable across sessions.
    pub row_id_seed: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            validate_on_load: true,
            validate_on_change: true,
            row_id_seed: None,
        }
    }
}

impl SessionOptions {
    /// Validate only on explicit request (submit, `validate_all`).
    pub fn deferred() -> Self {
        Self {
            validate_on_load: false,
            validate_on_change: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_row_id_seed(mut self, seed: impl Into<String>) -> Self {
        self.row_id_seed = Some(seed.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SessionOptions::default();
        assert!(options.validate_on_load);
        assert!(options.validate_on_change);
        assert_eq!(options.row_id_seed, None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let options: SessionOptions = serde_json::from_str(r#"{"validate_on_change": false}"#).unwrap();
        assert!(options.validate_on_load);
        assert!(!options.validate_on_change);
    }
}
