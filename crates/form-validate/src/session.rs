//! One editing session: the explicit form context.
//!
//! A session owns the store and the orchestrator of exactly one form. It is
//! acquired with [`FormSession::open`] and torn down by
//! [`FormSession::close`] or by dropping it; validator results that arrive
//! after that are discarded.

use std::sync::Arc;

use form_model::{FormError, Path, Result, Value};
use form_state::{
    CapabilityRegistry, Dispatched, FormAction, FormState, FormStore,
    ValidationRequest,
};
use tracing::{debug, info, warn};

use crate::aggregate::{form_is_valid, invalid_fields};
use crate::options::SessionOptions;
use crate::orchestrator::{ValidationOrchestrator, ValidationResult};

/// Live editing state of one form plus its pending validations.
#[derive(Debug)]
pub struct FormSession {
    store: FormStore,
    orchestrator: ValidationOrchestrator,
    options: SessionOptions,
    closed: bool,
}

impl FormSession {
    /// Load a document into a new session.
    pub fn open(
        registry: Arc<CapabilityRegistry>,
        document: &Value,
        options: SessionOptions,
    ) -> Result<Self> {
        let state = match options.row_id_seed.as_deref() {
            Some(seed) => FormState::from_document_with_seed(registry, document, seed)?,
            None => FormState::from_document(registry, document)?,
        };
        Ok(Self::from_state(state, options))
    }

    /// Start a session on an existing state (one received across a context
    /// boundary, say).
    pub fn from_state(state: FormState, options: SessionOptions) -> Self {
        let mut session = Self {
            store: FormStore::new(state),
            orchestrator: ValidationOrchestrator::new(),
            options,
            closed: false,
        };
        info!(fields = session.state().len(), "Opened form session");
        if session.options.validate_on_load {
            let pending = session.state().pending_validations();
            session.schedule(pending);
        }
        session
    }

    pub fn state(&self) -> &FormState {
        self.store.state()
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Validations started but not applied yet.
    pub fn pending(&self) -> usize {
        self.orchestrator.in_flight()
    }

    pub fn get_value(&self, path: &Path) -> Result<&Value> {
        self.store.get_value(path)
    }

    /// Apply one action and start the validations it asks for.
    pub fn dispatch(&mut self, action: FormAction) -> Result<Dispatched> {
        let validate = match action {
            FormAction::ReplaceState(_) => self.options.validate_on_load,
            _ => self.options.validate_on_change,
        };
        let outcome = self.store.dispatch(action)?;
        if validate {
            self.schedule(outcome.validations.iter().cloned());
        }
        Ok(outcome)
    }

    fn schedule(&mut self, requests: impl IntoIterator<Item = ValidationRequest>) {
        for request in requests {
            self.orchestrator.request_validation(request);
        }
    }

    fn apply(&mut self, result: ValidationResult) -> bool {
        match self.store.dispatch(result.into_action()) {
            Ok(outcome) => !outcome.discarded,
            Err(err) => {
                warn!("Could not apply validation result: {}", err);
                false
            }
        }
    }

    /// Apply every result that is already available; returns how many
    /// changed a field.
    pub fn apply_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Some(result) = self.orchestrator.try_next() {
            if self.apply(result) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until every started validation has reported back.
    pub async fn settle(&mut self) {
        while let Some(result) = self.orchestrator.next().await {
            self.apply(result);
        }
    }

    /// Re-validate every field, whatever its current validity.
    pub fn validate_all(&mut self) -> usize {
        let requests = self.state().all_validations();
        let count = requests.len();
        self.schedule(requests);
        count
    }

    pub fn is_valid(&self) -> bool {
        form_is_valid(self.state())
    }

    /// A field is dirty, or rows changed, since load.
    pub fn is_modified(&self) -> bool {
        self.store.is_modified()
    }

    /// Validate everything, wait for the results and hand back the form
    /// data for storage. Blocked while any visible field is not valid.
    pub async fn submit(&mut self) -> Result<Value> {
        self.validate_all();
        self.settle().await;

        let invalid = invalid_fields(self.state());
        if !invalid.is_empty() {
            warn!(invalid = invalid.len(), "Submission blocked by invalid fields");
            return Err(FormError::FormInvalid { invalid });
        }
        info!(fields = self.state().len(), "Form submitted");
        Ok(self.state().to_values())
    }

    /// End the session and return its final state. Validations still in
    /// flight are discarded.
    pub fn close(mut self) -> FormState {
        self.closed = true;
        info!(
            dropped = self.orchestrator.in_flight(),
            modified = self.is_modified(),
            "Closed form session"
        );
        self.store.state().clone()
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        if !self.closed {
            debug!(
                dropped = self.orchestrator.in_flight(),
                "Form session dropped without close"
            );
        }
    }
}
