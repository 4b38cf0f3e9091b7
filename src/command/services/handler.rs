//! The request pipeline for a single command.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;
use tracing::{error, info, warn};

use super::guard::{catch_panic, elapsed_ms};
use crate::command::domain::{CommandRequest, CommandResponse, ValidatedInput};
use crate::command::ports::{DataTransformer, RequestHandler, ServiceMethod, Validator};
use crate::outcome::{Failure, Outcome};

/// Validates a request, invokes a service and produces one response.
///
/// Validation failures and service failures are answered with their own
/// status and message. Panics in the service, the transformer or the
/// validator are answered with 500 `internal error in <context>`.
///
/// # Examples
///
/// ```
/// use conservatory::command::domain::{CommandRequest, ValidatedInput};
/// use conservatory::command::ports::service_fn;
/// use conservatory::command::services::CommandHandler;
/// use conservatory::outcome::Outcome;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let handler = CommandHandler::new(
///     "materials.echo",
///     service_fn(|input: ValidatedInput| async move { Outcome::Ok(input.body().clone()) }),
/// )
/// .with_success_status(StatusCode::ACCEPTED);
/// # tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(async {
/// let response = handler.execute(&CommandRequest::new().with_body(json!({"a": 1}))).await;
/// assert_eq!(response.status(), StatusCode::ACCEPTED);
/// assert_eq!(response.data(), Some(&json!({"a": 1})));
/// # });
/// ```
#[derive(Clone)]
pub struct CommandHandler {
    context: String,
    service: Arc<dyn ServiceMethod>,
    validator: Option<Arc<dyn Validator>>,
    transformer: Option<Arc<dyn DataTransformer>>,
    success_status: StatusCode,
    success_message: Option<String>,
}

impl CommandHandler {
    /// Creates a handler answering 200 with the service payload.
    #[must_use]
    pub fn new(context: impl Into<String>, service: impl ServiceMethod + 'static) -> Self {
        Self::from_shared(context, Arc::new(service))
    }

    /// Creates a handler from a shared service.
    #[must_use]
    pub fn from_shared(context: impl Into<String>, service: Arc<dyn ServiceMethod>) -> Self {
        Self {
            context: context.into(),
            service,
            validator: None,
            transformer: None,
            success_status: StatusCode::OK,
            success_message: None,
        }
    }

    /// Validates requests with `validator` before invoking the service.
    #[must_use]
    pub fn with_validator(self, validator: impl Validator + 'static) -> Self {
        self.with_shared_validator(Arc::new(validator))
    }

    /// Validates requests with a shared validator.
    #[must_use]
    pub fn with_shared_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Sets the status used for successful responses.
    #[must_use]
    pub const fn with_success_status(mut self, status: StatusCode) -> Self {
        self.success_status = status;
        self
    }

    /// Attaches a message to successful responses.
    #[must_use]
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// Post-processes successful payloads.
    #[must_use]
    pub fn with_transformer(mut self, transformer: impl DataTransformer + 'static) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    /// Logging context, usually the command name.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Status used for successful responses.
    #[must_use]
    pub const fn success_status(&self) -> StatusCode {
        self.success_status
    }

    /// Runs the pipeline for `request`.
    pub async fn execute(&self, request: &CommandRequest) -> CommandResponse {
        let started = Instant::now();
        match catch_panic(self.run(request, started)).await {
            Ok(response) => response,
            Err(panic) => {
                error!(
                    context = %self.context,
                    elapsed_ms = elapsed_ms(started),
                    panic = %panic,
                    "command pipeline panicked"
                );
                CommandResponse::internal_error(&self.context)
            }
        }
    }

    async fn run(&self, request: &CommandRequest, started: Instant) -> CommandResponse {
        let outcome = match self.validate(request) {
            Ok(input) => self.invoke(input).await,
            Err(failed) => Err(failed),
        };
        let payload = match outcome {
            Ok(data) => self.transform(data).await,
            Err(failed) => Err(failed),
        };

        let elapsed = elapsed_ms(started);
        match payload {
            Ok(data) => {
                info!(
                    context = %self.context,
                    elapsed_ms = elapsed,
                    status = self.success_status.as_u16(),
                    "command succeeded"
                );
                CommandResponse::Success {
                    status: self.success_status,
                    data,
                    message: self.success_message.clone(),
                }
            }
            Err(failed) => {
                warn!(
                    context = %self.context,
                    elapsed_ms = elapsed,
                    status = failed.status().as_u16(),
                    error = %failed,
                    "command failed"
                );
                failed.into()
            }
        }
    }

    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput> {
        self.validator.as_ref().map_or_else(
            || Ok(ValidatedInput::from_request(request)),
            |validator| validator.validate(request),
        )
    }

    async fn invoke(&self, input: ValidatedInput) -> Outcome<Value> {
        match catch_panic(self.service.call(input)).await {
            Ok(outcome) => outcome,
            Err(panic) => {
                error!(context = %self.context, panic = %panic, "service panicked");
                Err(self.internal_failure())
            }
        }
    }

    async fn transform(&self, data: Value) -> Outcome<Value> {
        let Some(transformer) = &self.transformer else {
            return Ok(data);
        };
        transformer.transform(data).await.map_err(|failed| {
            error!(context = %self.context, error = %failed, "response transformation failed");
            self.internal_failure()
        })
    }

    fn internal_failure(&self) -> Failure {
        Failure::internal(format!("internal error in {}", self.context))
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandler")
            .field("context", &self.context)
            .field("validator", &self.validator.is_some())
            .field("transformer", &self.transformer.is_some())
            .field("success_status", &self.success_status)
            .field("success_message", &self.success_message)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestHandler for CommandHandler {
    async fn handle(&self, request: &CommandRequest) -> CommandResponse {
        self.execute(request).await
    }
}
