//! Field capabilities: the non-data members of a field.
//!
//! Validators, condition predicates and render hooks exist only inside the
//! process that defined them. They ride alongside a field's live state and
//! are dropped at the serialization boundary; the receiving side gets them
//! back from a [`crate::CapabilityRegistry`].

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use form_model::{FieldKind, FieldTypeId, Path, Value};

use crate::field::FieldState;

/// Outcome of a validator: `Err` carries the user-facing reason.
pub type ValidationOutcome = std::result::Result<(), String>;

/// Boxed future returned by asynchronous validators.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type SyncValidateFn = dyn Fn(&Value, &ValidationContext) -> ValidationOutcome + Send + Sync;
type AsyncValidateFn = dyn Fn(Value, ValidationContext) -> BoxFuture<ValidationOutcome> + Send + Sync;

/// Explicit context handed to every validator invocation.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Path of the field being validated.
    pub path: Path,
    /// Declared field type, when the field has capabilities.
    pub field_type: Option<FieldTypeId>,
    /// Values of the field's siblings, keyed by name.
    pub siblings: BTreeMap<String, Value>,
    /// The whole form reduced to nested data.
    pub data: Arc<Value>,
}

impl ValidationContext {
    pub fn sibling(&self, name: &str) -> Option<&Value> {
        self.siblings.get(name)
    }
}

/// A field validator, synchronous or asynchronous.
#[derive(Clone)]
pub enum Validator {
    Sync(Arc<SyncValidateFn>),
    Async(Arc<AsyncValidateFn>),
}

impl Validator {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Value, &ValidationContext) -> ValidationOutcome + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ValidationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ValidationOutcome> + Send + 'static,
    {
        Self::Async(Arc::new(move |value, context| Box::pin(f(value, context))))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    /// True if both refer to the same validator function.
    pub fn same_as(&self, other: &Validator) -> bool {
        match (self, other) {
            (Self::Sync(a), Self::Sync(b)) => Arc::ptr_eq(a, b),
            (Self::Async(a), Self::Async(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Validator::Sync"),
            Self::Async(_) => f.write_str("Validator::Async"),
        }
    }
}

/// Input of a condition predicate.
#[derive(Debug, Clone, Copy)]
pub struct ConditionContext<'a> {
    /// Values of the field's siblings (the field itself included).
    pub siblings: &'a BTreeMap<String, Value>,
    /// The whole form reduced to nested data.
    pub data: &'a Value,
}

impl ConditionContext<'_> {
    pub fn sibling(&self, name: &str) -> Option<&Value> {
        self.siblings.get(name)
    }
}

type PredicateFn = dyn Fn(&ConditionContext<'_>) -> bool + Send + Sync;

/// Visibility predicate with an explicit list of the siblings it reads.
///
/// The predicate is re-evaluated whenever one of `depends_on` changes value.
#[derive(Clone)]
pub struct Condition {
    depends_on: Vec<String>,
    predicate: Arc<PredicateFn>,
}

impl Condition {
    pub fn new<I, S, F>(depends_on: I, predicate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ConditionContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            depends_on: depends_on.into_iter().map(Into::into).collect(),
            predicate: Arc::new(predicate),
        }
    }

    /// Visible while sibling `name` equals `expected`.
    pub fn sibling_equals(name: &str, expected: Value) -> Self {
        let key = name.to_string();
        Self::new([name], move |ctx| ctx.sibling(&key) == Some(&expected))
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub fn reads(&self, sibling: &str) -> bool {
        self.depends_on.iter().any(|name| name == sibling)
    }

    pub fn evaluate(&self, context: &ConditionContext<'_>) -> bool {
        (self.predicate)(context)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// Input of a render hook.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub path: &'a Path,
    pub field: &'a FieldState,
    /// Current row index when the field is a row.
    pub row_index: Option<usize>,
    /// The field's subtree reduced to nested data.
    pub data: &'a Value,
}

type RenderFn = dyn Fn(&RenderContext<'_>) -> String + Send + Sync;

/// Produces a display label for a field or row.
#[derive(Clone)]
pub struct RenderHook(Arc<RenderFn>);

impl RenderHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RenderContext<'_>) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn render(&self, context: &RenderContext<'_>) -> String {
        (self.0)(context)
    }
}

impl fmt::Debug for RenderHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderHook")
    }
}

/// Everything the schema declares about one field shape.
#[derive(Debug, Clone)]
pub struct FieldCapabilities {
    field_type: FieldTypeId,
    kind: FieldKind,
    default_value: Value,
    validator: Option<Validator>,
    condition: Option<Condition>,
    render_hook: Option<RenderHook>,
}

impl FieldCapabilities {
    pub fn new(field_type: impl Into<FieldTypeId>, kind: FieldKind) -> Self {
        Self {
            field_type: field_type.into(),
            kind,
            default_value: Value::Null,
            validator: None,
            condition: None,
            render_hook: None,
        }
    }

    pub fn leaf(field_type: impl Into<FieldTypeId>) -> Self {
        Self::new(field_type, FieldKind::Leaf)
    }

    pub fn group(field_type: impl Into<FieldTypeId>) -> Self {
        Self::new(field_type, FieldKind::Group)
    }

    pub fn array(field_type: impl Into<FieldTypeId>) -> Self {
        Self::new(field_type, FieldKind::Array)
    }

    pub fn row(field_type: impl Into<FieldTypeId>) -> Self {
        Self::new(field_type, FieldKind::Row)
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_render_hook(mut self, hook: RenderHook) -> Self {
        self.render_hook = Some(hook);
        self
    }

    pub fn field_type(&self) -> &FieldTypeId {
        &self.field_type
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn render_hook(&self) -> Option<&RenderHook> {
        self.render_hook.as_ref()
    }
}
