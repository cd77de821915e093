//! Core data model for the form state engine.
//!
//! - `path` - structural path strings (`variants.2.images.0.image`) and the
//!   pure resolver functions over them
//! - `ids` - row identities, field type identities and generation stamps
//! - `value` - live field values, including in-process handles that never
//!   cross a serialization boundary
//! - `field` - field kinds and validity
//! - `error` - the error taxonomy shared by every crate in the workspace

pub mod error;
pub mod field;
pub mod ids;
pub mod path;
pub mod value;

pub use error::{FormError, Result};
pub use field::{FieldKind, Validity};
pub use ids::{FieldTypeId, Generation, RowId};
pub use path::{
    FieldName, Path, Segment, is_descendant_of, normalize, parent_of, rewrite_row_index, shape_of,
};
pub use value::{LiveHandle, NotTransmissible, Value};
