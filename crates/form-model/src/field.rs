//! Field kinds and validity.

use serde::{Deserialize, Serialize};

/// Structural kind of a node in the form tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// A field holding a value.
    Leaf,
    /// A named, non-repeating container of fields.
    Group,
    /// A repeating group. Its children are rows.
    Array,
    /// One entry of a repeating group.
    Row,
}

impl FieldKind {
    /// Containers hold no data of their own and never block form validity.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Group | Self::Row)
    }

    /// Kinds whose value may be set directly by `SET_VALUE`.
    pub fn accepts_value(self) -> bool {
        matches!(self, Self::Leaf)
    }

    /// Kinds that take part in validation.
    pub fn is_validated(self) -> bool {
        matches!(self, Self::Leaf | Self::Array)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Group => "group",
            Self::Array => "array",
            Self::Row => "row",
        }
    }
}

/// Validation state of one field.
///
/// On the wire: `"unvalidated"`, `"valid"` or `{"invalid": "<reason>"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    /// No validation result for the current value yet.
    #[default]
    Unvalidated,
    Valid,
    /// User-correctable failure, shown inline at the field.
    Invalid(String),
}

impl Validity {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Failure reason, if invalid.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Invalid(reason) => Some(reason),
            _ => None,
        }
    }

    /// Map a validator outcome onto a validity state.
    pub fn from_outcome(outcome: std::result::Result<(), String>) -> Self {
        match outcome {
            Ok(()) => Self::Valid,
            Err(reason) => Self::Invalid(reason),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unvalidated => "unvalidated",
            Self::Valid => "valid",
            Self::Invalid(_) => "invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_wire_format() {
        assert_eq!(serde_json::to_string(&Validity::Valid).unwrap(), "\"valid\"");
        assert_eq!(
            serde_json::to_string(&Validity::Unvalidated).unwrap(),
            "\"unvalidated\""
        );
        assert_eq!(
            serde_json::to_string(&Validity::invalid("required")).unwrap(),
            "{\"invalid\":\"required\"}"
        );
        let parsed: Validity = serde_json::from_str("{\"invalid\":\"too short\"}").unwrap();
        assert_eq!(parsed.reason(), Some("too short"));
    }

    #[test]
    fn containers_are_not_validated() {
        assert!(FieldKind::Row.is_container());
        assert!(FieldKind::Group.is_container());
        assert!(!FieldKind::Array.is_container());
        assert!(FieldKind::Array.is_validated());
        assert!(!FieldKind::Array.accepts_value());
    }
}
