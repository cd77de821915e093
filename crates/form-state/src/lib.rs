//! Form state store, row operations and field capability registry.
//!
//! A [`FormState`] is an arena tree of [`FieldState`] nodes. Paths are
//! derived from each node's position, so row operations reorder nodes
//! instead of rewriting keys. All mutation goes through
//! [`FormStore::dispatch`], which applies one [`FormAction`] atomically and
//! returns the [`ValidationRequest`]s the change produced.
//!
//! Validators, conditions and render hooks are [`FieldCapabilities`] looked
//! up in a [`CapabilityRegistry`] by structural shape.

mod action;
mod build;
pub mod capability;
mod condition;
mod field;
pub mod registry;
mod request;
mod rows;
mod store;
mod tree;

pub use action::FormAction;
pub use build::FormStateBuilder;
pub use capability::{
    BoxFuture, Condition, ConditionContext, FieldCapabilities, RenderContext, RenderHook,
    ValidationContext, ValidationOutcome, Validator,
};
pub use field::{FieldRecord, FieldState};
pub use registry::CapabilityRegistry;
pub use request::{Dispatched, PathRewrite, ValidationRequest};
pub use store::FormStore;
pub use tree::{FormState, ROW_ID_KEY, unique_row_seed};
