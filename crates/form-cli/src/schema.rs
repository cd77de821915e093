//! Field declarations read from JSON.
//!
//! ```json
//! {
//!   "fields": [
//!     {"path": "name", "type": "text", "required": true, "maxLength": 80},
//!     {"path": "kind", "type": "select", "default": "page"},
//!     {"path": "url", "type": "text", "required": true,
//!      "visibleWhen": {"field": "kind", "equals": "link"}},
//!     {"path": "tags", "type": "tags", "kind": "array", "maxRows": 5},
//!     {"path": "tags.*", "type": "tag", "kind": "row", "label": "Tag {index}"},
//!     {"path": "tags.*.value", "type": "text", "required": true}
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use form_model::{FieldKind, Value};
use form_state::{CapabilityRegistry, Condition, FieldCapabilities, RenderHook, Validator};
use form_validate::builtin;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    pub fields: Vec<FieldDeclaration>,
}

/// One declared shape and the capabilities it gets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDeclaration {
    /// Shape, with `*` for row indices.
    pub path: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Leaf unless stated.
    pub kind: Option<FieldKind>,
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    #[serde(default)]
    pub email: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
    pub pattern_message: Option<String>,
    pub min_rows: Option<usize>,
    pub max_rows: Option<usize>,
    pub visible_when: Option<VisibleWhen>,
    /// Display label; `{index}` is the 1-based row number and `{value}`
    /// the field value.
    pub label: Option<String>,
}

/// Show a field only while a sibling holds a given value.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisibleWhen {
    pub field: String,
    pub equals: serde_json::Value,
}

impl Schema {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read schema {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse schema {}", path.display()))
    }

    /// Declare every field, in file order.
    pub fn registry(&self) -> Result<CapabilityRegistry> {
        let mut registry = CapabilityRegistry::new();
        for declaration in &self.fields {
            let capabilities = declaration
                .capabilities()
                .with_context(|| format!("field '{}'", declaration.path))?;
            registry
                .declare(&declaration.path, capabilities)
                .with_context(|| format!("declare '{}'", declaration.path))?;
        }
        Ok(registry)
    }
}

impl FieldDeclaration {
    pub fn kind(&self) -> FieldKind {
        self.kind.unwrap_or(FieldKind::Leaf)
    }

    /// Names of the validators this declaration turns on.
    pub fn rules(&self) -> Vec<&'static str> {
        let mut rules = Vec::new();
        if self.required {
            rules.push("required");
        }
        if self.min_length.is_some() || self.max_length.is_some() {
            rules.push("length");
        }
        if self.email {
            rules.push("email");
        }
        if self.min.is_some() || self.max.is_some() {
            rules.push("range");
        }
        if self.pattern.is_some() {
            rules.push("pattern");
        }
        if self.min_rows.is_some() || self.max_rows.is_some() {
            rules.push("rows");
        }
        rules
    }

    fn validators(&self) -> Result<Vec<Validator>> {
        let mut validators = Vec::new();
        if self.required {
            validators.push(builtin::required());
        }
        if self.min_length.is_some() || self.max_length.is_some() {
            validators.push(builtin::text_length(self.min_length, self.max_length));
        }
        if self.email {
            validators.push(builtin::email());
        }
        if self.min.is_some() || self.max.is_some() {
            validators.push(builtin::number_range(self.min, self.max));
        }
        if let Some(pattern) = &self.pattern {
            let message = self
                .pattern_message
                .clone()
                .unwrap_or_else(|| format!("This value must match {pattern}."));
            validators.push(builtin::pattern(pattern, message).context("invalid pattern")?);
        }
        if self.min_rows.is_some() || self.max_rows.is_some() {
            validators.push(builtin::rows(self.min_rows, self.max_rows));
        }
        Ok(validators)
    }

    pub fn capabilities(&self) -> Result<FieldCapabilities> {
        let mut capabilities = FieldCapabilities::new(self.field_type.as_str(), self.kind());
        if let Some(default) = &self.default {
            capabilities = capabilities.with_default(Value::from(default.clone()));
        }

        let mut validators = self.validators()?;
        match validators.len() {
            0 => {}
            1 => capabilities = capabilities.with_validator(validators.remove(0)),
            _ => capabilities = capabilities.with_validator(builtin::all(validators)),
        }

        if let Some(visible_when) = &self.visible_when {
            capabilities = capabilities.with_condition(Condition::sibling_equals(
                &visible_when.field,
                Value::from(visible_when.equals.clone()),
            ));
        }
        if let Some(template) = &self.label {
            capabilities = capabilities.with_render_hook(label_hook(template.clone()));
        }
        Ok(capabilities)
    }
}

fn label_hook(template: String) -> RenderHook {
    RenderHook::new(move |ctx| {
        let index = ctx
            .row_index
            .map(|index| (index + 1).to_string())
            .unwrap_or_default();
        let value = ctx.field.value().as_str().map_or_else(
            || ctx.field.value().to_string(),
            str::to_string,
        );
        template.replace("{index}", &index).replace("{value}", &value)
    })
}
