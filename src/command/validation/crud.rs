//! Validator for commands addressing a single entity by `id`.

use crate::command::domain::{CommandRequest, ValidatedInput};
use crate::command::ports::{Schema, Validator};
use crate::outcome::{Failure, Outcome};

use super::channels::{ChannelSchemas, validate};

/// Requires a non-empty `id` path parameter and optionally a body schema.
#[derive(Debug, Clone, Default)]
pub struct CrudValidator {
    schemas: ChannelSchemas,
}

impl CrudValidator {
    /// Creates a validator that only checks for `id`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the body with `schema` once `id` is present.
    #[must_use]
    pub fn with_body(mut self, schema: impl Schema + 'static) -> Self {
        self.schemas = self.schemas.with_body(schema);
        self
    }
}

impl Validator for CrudValidator {
    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput> {
        let input = ValidatedInput::from_request(request);
        if input.id().is_none() {
            return Err(Failure::validation("missing required parameter: id"));
        }
        validate(request, &self.schemas)
    }
}
