//! Replaying a script of actions through an editing session.

use std::sync::Arc;

use anyhow::{Result, bail};
use form_model::{FieldKind, FormError, Path, Validity, Value};
use form_state::{CapabilityRegistry, FormState};
use form_validate::{FormSession, SessionOptions};
use tracing::{debug, trace, warn};

use crate::logging::redact_value;
use crate::script::ScriptStep;

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Seed for row identities.
    pub seed: Option<String>,
    /// Validate only once, after the last step.
    pub deferred: bool,
    /// Submit after the last step.
    pub submit: bool,
}

impl ReplayOptions {
    fn session_options(&self) -> SessionOptions {
        let options = if self.deferred {
            SessionOptions::deferred()
        } else {
            SessionOptions::default()
        };
        match &self.seed {
            Some(seed) => options.with_row_id_seed(seed.clone()),
            None => options,
        }
    }
}

/// What one script step did.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// 1-based position in the script.
    pub index: usize,
    pub action: &'static str,
    pub validations: usize,
    pub rewrites: usize,
    /// The action was rejected; the form is unchanged.
    pub error: Option<String>,
}

/// One row of the final field table.
#[derive(Debug, Clone)]
pub struct FieldSummary {
    pub path: Path,
    pub kind: FieldKind,
    pub value: String,
    pub validity: Validity,
    pub visible: bool,
    pub dirty: bool,
    pub label: Option<String>,
}

#[derive(Debug)]
pub struct ReplayResult {
    pub steps: Vec<StepOutcome>,
    pub fields: Vec<FieldSummary>,
    pub valid: bool,
    pub modified: bool,
    /// Data handed over by a successful submit.
    pub submitted: Option<Value>,
    /// Fields that blocked the submit.
    pub blocked: Vec<Path>,
    pub state: FormState,
}

impl ReplayResult {
    pub fn rejected_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.error.is_some()).count()
    }
}

/// Apply `steps` to `document` and settle all validation.
///
/// Rejected actions (unknown paths and the like) are recorded and the replay
/// goes on. A structural inconsistency aborts it.
pub async fn replay(
    registry: Arc<CapabilityRegistry>,
    document: &Value,
    steps: Vec<ScriptStep>,
    options: &ReplayOptions,
) -> Result<ReplayResult> {
    let mut session = FormSession::open(registry, document, options.session_options())?;
    let mut outcomes = Vec::with_capacity(steps.len());

    for (position, step) in steps.into_iter().enumerate() {
        let action = step.into_action();
        let name = action.name();
        if let form_state::FormAction::SetValue { path, value } = &action {
            trace!(path = %path, value = redact_value(&value.to_string()), "Script sets value");
        }
        let outcome = match session.dispatch(action) {
            Ok(dispatched) => StepOutcome {
                index: position + 1,
                action: name,
                validations: dispatched.validations.len(),
                rewrites: dispatched.rewrites.len(),
                error: None,
            },
            Err(err) if err.is_defect() => {
                bail!("step {} ({name}) broke the form: {err}", position + 1);
            }
            Err(err) => {
                warn!(step = position + 1, action = name, "Action rejected: {}", err);
                StepOutcome {
                    index: position + 1,
                    action: name,
                    validations: 0,
                    rewrites: 0,
                    error: Some(err.to_string()),
                }
            }
        };
        outcomes.push(outcome);
        session.apply_ready();
    }

    let mut submitted = None;
    let mut blocked = Vec::new();
    if options.submit {
        match session.submit().await {
            Ok(data) => submitted = Some(data),
            Err(FormError::FormInvalid { invalid }) => blocked = invalid,
            Err(err) => return Err(err.into()),
        }
    } else {
        if options.deferred {
            session.validate_all();
        }
        session.settle().await;
    }

    let valid = session.is_valid();
    let modified = session.is_modified();
    let state = session.close();
    let fields = summarize(&state);
    debug!(fields = fields.len(), valid, "Replay finished");

    Ok(ReplayResult {
        steps: outcomes,
        fields,
        valid,
        modified,
        submitted,
        blocked,
        state,
    })
}

fn summarize(state: &FormState) -> Vec<FieldSummary> {
    state
        .iter()
        .map(|(path, field)| FieldSummary {
            kind: field.kind(),
            value: display_value(field.value()),
            validity: field.validity().clone(),
            visible: state.is_visible(&path).unwrap_or(false),
            dirty: field.is_dirty(),
            label: state.render_label(&path).ok().flatten(),
            path,
        })
        .collect()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
