//! Sequential composition of validators.

use std::fmt;
use std::sync::Arc;

use crate::command::domain::{CommandRequest, ValidatedInput};
use crate::command::ports::Validator;
use crate::outcome::Outcome;

/// Runs validators in order, stopping at the first failure.
///
/// Each validator sees the request with the channels produced by its
/// predecessor, so coercions carry forward. The combined success is the
/// last validator's output.
#[derive(Clone, Default)]
pub struct CombinedValidator {
    steps: Vec<Arc<dyn Validator>>,
}

impl CombinedValidator {
    /// Creates a combined validator from shared validators.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = Arc<dyn Validator>>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Appends a validator.
    #[must_use]
    pub fn then(mut self, step: impl Validator + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Number of composed validators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` when no validator is composed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for CombinedValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedValidator")
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl Validator for CombinedValidator {
    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput> {
        let mut current = ValidatedInput::from_request(request);
        for step in &self.steps {
            current = step.validate(&request.with_validated(&current))?;
        }
        Ok(current)
    }
}

/// Composes validators into a [`CombinedValidator`].
#[must_use]
pub fn combine_validators(
    steps: impl IntoIterator<Item = Arc<dyn Validator>>,
) -> CombinedValidator {
    CombinedValidator::new(steps)
}
