use std::fmt;

use sha2::{Digest, Sha256};

/// Stable identity of one row of a repeating group.
///
/// Assigned when the row is created and kept for the row's whole life,
/// independent of its current index. Rendered as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId([u8; 16]);

impl RowId {
    /// Deterministically derive an identity from a seed and a counter.
    ///
    /// The same `(seed, counter)` pair always yields the same identity, which
    /// keeps row actions replayable.
    pub fn derive(seed: &str, counter: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(b":");
        hasher.update(counter.to_le_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 16];
        out.copy_from_slice(&digest[..16]);
        Self(out)
    }

    /// Parse the lowercase (or uppercase) hex rendering.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s.trim()).ok()?;
        if bytes.len() != 16 {
            return None;
        }
        let mut out = [0u8; 16];
        out.copy_from_slice(&bytes);
        Some(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl serde::Serialize for RowId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for RowId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("RowId must be 16 hex-encoded bytes"))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Identity of a field type (`text`, `email`, `array`, ...).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FieldTypeId(String);

impl FieldTypeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FieldTypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldTypeId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for FieldTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generation stamp of a field.
///
/// Stamps come from a single monotonic clock per form, so a stamp observed at
/// any path only ever increases and never repeats across fields.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic_and_distinct() {
        let a = RowId::derive("session", 0);
        assert_eq!(a, RowId::derive("session", 0));
        assert_ne!(a, RowId::derive("session", 1));
        assert_ne!(a, RowId::derive("other", 0));
    }

    #[test]
    fn hex_round_trip() {
        let id = RowId::derive("seed", 7);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 32);
        assert_eq!(RowId::from_hex(&hex), Some(id));
        assert_eq!(RowId::from_hex("abc"), None);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{hex}\""));
    }
}
