//! Validator and schema ports.

use serde_json::Value;
use thiserror::Error;

use crate::command::domain::{CommandRequest, ValidatedInput};
use crate::outcome::Outcome;

/// Turns an inbound request into validated input or a failure.
///
/// Validators are pure: they inspect the request and never touch storage.
/// Any closure `Fn(&CommandRequest) -> Outcome<ValidatedInput>` is a
/// validator.
pub trait Validator: Send + Sync {
    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns a [`Failure`](crate::outcome::Failure) describing the first
    /// rule that did not hold.
    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput>;
}

impl<F> Validator for F
where
    F: Fn(&CommandRequest) -> Outcome<ValidatedInput> + Send + Sync,
{
    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput> {
        self(request)
    }
}

/// Reason a value was rejected by a [`Schema`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SchemaViolation(String);

impl SchemaViolation {
    /// Creates a violation with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// Reason text.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Declarative rule for one request channel.
///
/// A schema returns the validated, possibly coerced, value. Any closure
/// `Fn(&Value) -> Result<Value, SchemaViolation>` is a schema.
pub trait Schema: Send + Sync {
    /// Validates and coerces `value`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaViolation`] for the first rule that fails.
    fn validate(&self, value: &Value) -> Result<Value, SchemaViolation>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> Result<Value, SchemaViolation> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<Value, SchemaViolation> {
        self(value)
    }
}
