//! Library components of formctl.

pub mod logging;
pub mod replay;
pub mod schema;
pub mod script;
