//! Preconfigured handlers for the common command shapes.

use std::sync::Arc;

use http::StatusCode;

use super::handler::CommandHandler;
use crate::command::ports::{ServiceMethod, Validator};
use crate::command::validation::QueryValidator;

/// Message attached to successful creations.
pub const CREATED_MESSAGE: &str = "resource created successfully";

/// Handler answering 200, validated by `validator` when given.
#[must_use]
pub fn crud_command(
    context: impl Into<String>,
    service: Arc<dyn ServiceMethod>,
    validator: Option<Arc<dyn Validator>>,
) -> CommandHandler {
    let handler = CommandHandler::from_shared(context, service);
    match validator {
        Some(shared) => handler.with_shared_validator(shared),
        None => handler,
    }
}

/// Listing handler answering 200.
///
/// Without an explicit validator the query is checked by a default
/// [`QueryValidator`].
#[must_use]
pub fn query_command(
    context: impl Into<String>,
    service: Arc<dyn ServiceMethod>,
    validator: Option<Arc<dyn Validator>>,
) -> CommandHandler {
    let checks: Arc<dyn Validator> = match validator {
        Some(shared) => shared,
        None => Arc::new(QueryValidator::new()),
    };
    CommandHandler::from_shared(context, service).with_shared_validator(checks)
}

/// Creation handler answering 201 with [`CREATED_MESSAGE`].
#[must_use]
pub fn create_command(
    context: impl Into<String>,
    service: Arc<dyn ServiceMethod>,
    validator: Option<Arc<dyn Validator>>,
) -> CommandHandler {
    crud_command(context, service, validator)
        .with_success_status(StatusCode::CREATED)
        .with_success_message(CREATED_MESSAGE)
}
