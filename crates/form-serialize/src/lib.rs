//! The serialization boundary of the form state engine.
//!
//! Live form state holds capabilities (validators, conditions, render
//! hooks) and may hold live handles in values. Neither can leave the
//! process. This crate turns a [`form_state::FormState`] into a plain data
//! [`SerializedState`] and back, and stores serialized states between the
//! steps of a multi-step flow.
//!
//! # Round trip
//!
//! `deserialize(&serialize(&state), registry)` reproduces `value`,
//! `initialValue`, `validity`, `passesCondition` and `rowCount` of every
//! field, given a registry that declares the same shapes.
//!
//! # Architecture
//!
//! - `wire.rs` - the transmissible records
//! - `boundary.rs` - serialize / deserialize
//! - `snapshot.rs` - step snapshots on disk
//! - `error.rs` - snapshot error types

mod boundary;
mod error;
mod snapshot;
mod wire;

pub use boundary::{deserialize, deserialize_with_seed, serialize, serialize_with_diagnostics};
pub use error::{Result, SnapshotError};
pub use snapshot::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION, StepSnapshot, load_snapshot, save_snapshot};
pub use wire::{SerializedField, SerializedState};
