//! Runs field validators and collects their results.
//!
//! Synchronous validators resolve on the spot. Asynchronous ones are spawned
//! on the tokio runtime and report back through a channel; nothing waits on
//! them and nothing cancels them. A result whose field changed in the
//! meantime is dropped by the store's generation check when it is applied.

use form_model::{Generation, Path, Validity};
use form_state::{FormAction, ValidationRequest, Validator};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Reason recorded when a validator could not produce an outcome.
pub const VALIDATOR_FAILED: &str = "Validation could not be completed.";

/// Outcome of one validation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub path: Path,
    /// Generation captured when the request was made.
    pub generation: Generation,
    pub validity: Validity,
}

impl ValidationResult {
    /// The generation-guarded action that applies this result.
    pub fn into_action(self) -> FormAction {
        FormAction::SetValidity {
            path: self.path,
            generation: self.generation,
            validity: self.validity,
        }
    }
}

/// Dispatches validation requests and queues their results.
#[derive(Debug)]
pub struct ValidationOrchestrator {
    sender: mpsc::UnboundedSender<ValidationResult>,
    receiver: mpsc::UnboundedReceiver<ValidationResult>,
    in_flight: usize,
    runtime: Option<Handle>,
}

impl Default for ValidationOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationOrchestrator {
    /// Create an orchestrator bound to the current tokio runtime, if any.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            in_flight: 0,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Create an orchestrator that spawns on `runtime`.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            runtime: Some(runtime),
            ..Self::new()
        }
    }

    /// Requests whose results have not been taken yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start validating one field.
    pub fn request_validation(&mut self, request: ValidationRequest) {
        self.in_flight += 1;
        let ValidationRequest {
            path,
            generation,
            value,
            validator,
            context,
        } = request;

        let validate = match validator {
            Some(Validator::Async(validate)) => validate,
            Some(Validator::Sync(validate)) => {
                let validity = Validity::from_outcome(validate(&value, &context));
                self.deliver(ValidationResult {
                    path,
                    generation,
                    validity,
                });
                return;
            }
            None => {
                self.deliver(ValidationResult {
                    path,
                    generation,
                    validity: Validity::Valid,
                });
                return;
            }
        };

        let Some(runtime) = &self.runtime else {
            warn!(path = %path, "No async runtime available, cannot run validator");
            self.deliver(ValidationResult {
                path,
                generation,
                validity: Validity::invalid(VALIDATOR_FAILED),
            });
            return;
        };

        let future = validate(value, context);
        let sender = self.sender.clone();
        let inner = runtime.clone();
        runtime.spawn(async move {
            // Run the validator in its own task so a panic surfaces as a
            // join error instead of losing the result.
            let outcome = inner.spawn(future).await.unwrap_or_else(|e| {
                error!(path = %path, "Validator task failed: {}", e);
                Err(VALIDATOR_FAILED.to_string())
            });
            let result = ValidationResult {
                path,
                generation,
                validity: Validity::from_outcome(outcome),
            };
            if sender.send(result).is_err() {
                debug!("Session closed, dropping late validation result");
            }
        });
    }

    fn deliver(&self, result: ValidationResult) {
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.sender.send(result);
    }

    /// Take a result that is already available.
    pub fn try_next(&mut self) -> Option<ValidationResult> {
        let result = self.receiver.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(result)
    }

    /// Wait for the next result. `None` once nothing is in flight.
    pub async fn next(&mut self) -> Option<ValidationResult> {
        if self.in_flight == 0 {
            return None;
        }
        let result = self.receiver.recv().await?;
        self.in_flight -= 1;
        Some(result)
    }
}
