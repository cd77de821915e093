//! Validation orchestration for the form state engine.
//!
//! - `orchestrator` - runs sync and async validators; results come back as
//!   generation-guarded `SET_VALIDITY` actions
//! - `aggregate` - form-level validity over visible fields
//! - `builtin` - stock validators (required, lengths, e-mail, ranges, rows)
//! - `session` - one editing session tying a store to an orchestrator
//! - `options` - session configuration

pub mod aggregate;
pub mod builtin;
pub mod options;
pub mod orchestrator;
pub mod session;

pub use aggregate::{field_errors, form_is_valid, invalid_fields};
pub use options::SessionOptions;
pub use orchestrator::{VALIDATOR_FAILED, ValidationOrchestrator, ValidationResult};
pub use session::FormSession;
