//! Domain service ports and the service-outcome adapter.
//!
//! Services return [`Outcome<Value>`](crate::outcome::Outcome). Callers that
//! still produce one of the older return shapes (a `{success, data, error}`
//! record, a `(data, error)` pair, or a bare value) go through
//! [`IntoServiceOutcome`], the single adapter at the service boundary.

use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;

use crate::command::domain::ValidatedInput;
use crate::outcome::{Failure, Outcome};

/// One invokable domain-service call.
#[async_trait]
pub trait ServiceMethod: Send + Sync {
    /// Invokes the service with validated input.
    async fn call(&self, input: ValidatedInput) -> Outcome<Value>;
}

/// [`ServiceMethod`] backed by an async closure.
///
/// Construct with [`service_fn`].
#[derive(Debug, Clone, Copy)]
pub struct ServiceFn<F> {
    f: F,
}

/// Wraps an async closure as a [`ServiceMethod`].
///
/// The closure may return any [`IntoServiceOutcome`] shape.
///
/// # Examples
///
/// ```
/// use conservatory::command::ports::{ServiceMethod, service_fn};
/// use conservatory::command::domain::{CommandRequest, ValidatedInput};
/// use conservatory::outcome::Outcome;
/// use serde_json::{Value, json};
///
/// let service = service_fn(|input: ValidatedInput| async move {
///     Outcome::Ok(input.body().clone())
/// });
/// # tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(async {
/// let input = ValidatedInput::from_request(&CommandRequest::new().with_body(json!({"a": 1})));
/// assert_eq!(service.call(input).await, Ok(json!({"a": 1})));
/// # });
/// ```
pub const fn service_fn<F>(f: F) -> ServiceFn<F> {
    ServiceFn { f }
}

#[async_trait]
impl<F, Fut, R> ServiceMethod for ServiceFn<F>
where
    F: Fn(ValidatedInput) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send,
    R: IntoServiceOutcome + Send,
{
    async fn call(&self, input: ValidatedInput) -> Outcome<Value> {
        (self.f)(input).await.into_service_outcome()
    }
}

/// Optional post-processing applied to a successful payload.
#[async_trait]
pub trait DataTransformer: Send + Sync {
    /// Transforms the payload.
    async fn transform(&self, data: Value) -> Outcome<Value>;
}

/// [`DataTransformer`] backed by an async closure.
#[derive(Debug, Clone, Copy)]
pub struct TransformFn<F> {
    f: F,
}

/// Wraps an async closure as a [`DataTransformer`].
pub const fn transform_fn<F>(f: F) -> TransformFn<F> {
    TransformFn { f }
}

#[async_trait]
impl<F, Fut> DataTransformer for TransformFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<Value>> + Send,
{
    async fn transform(&self, data: Value) -> Outcome<Value> {
        (self.f)(data).await
    }
}

/// The five canonical operations registered per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudOperation {
    /// Paginated listing.
    List,
    /// Single document by identifier.
    GetById,
    /// Document creation.
    Create,
    /// Document update by identifier.
    Update,
    /// Document removal by identifier.
    Delete,
}

impl CrudOperation {
    /// Operations in registration order.
    pub const ALL: [Self; 5] = [
        Self::List,
        Self::GetById,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];

    /// Suffix used in `<entity>.<operation>` command names.
    #[must_use]
    pub const fn command_suffix(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::GetById => "getById",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Entity service exposing the canonical CRUD operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrudService: Send + Sync {
    /// Lists entities using the validated pagination query.
    async fn list(&self, input: ValidatedInput) -> Outcome<Value>;

    /// Fetches the entity named by the `id` parameter.
    async fn get_by_id(&self, input: ValidatedInput) -> Outcome<Value>;

    /// Creates an entity from the body.
    async fn create(&self, input: ValidatedInput) -> Outcome<Value>;

    /// Updates the entity named by the `id` parameter.
    async fn update(&self, input: ValidatedInput) -> Outcome<Value>;

    /// Deletes the entity named by the `id` parameter.
    async fn delete(&self, input: ValidatedInput) -> Outcome<Value>;
}

/// Normalises a service return shape into an outcome.
pub trait IntoServiceOutcome {
    /// Converts `self` into `Outcome<Value>`.
    ///
    /// # Errors
    ///
    /// Returns the failure carried by `self`, or an internal failure when
    /// the payload cannot be serialised.
    fn into_service_outcome(self) -> Outcome<Value>;
}

impl<T: Serialize> IntoServiceOutcome for Outcome<T> {
    fn into_service_outcome(self) -> Outcome<Value> {
        self.and_then(|data| to_payload(&data))
    }
}

impl IntoServiceOutcome for Value {
    fn into_service_outcome(self) -> Outcome<Value> {
        Ok(self)
    }
}

/// Legacy `{success, data, error}` service record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord<T> {
    /// Whether the call succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(default)]
    pub data: Option<T>,
    /// Failure message.
    #[serde(default)]
    pub error: Option<String>,
    /// Failure status code; 400 when absent or unrecognised.
    #[serde(default)]
    pub status: Option<u16>,
}

impl<T: Serialize> IntoServiceOutcome for ServiceRecord<T> {
    fn into_service_outcome(self) -> Outcome<Value> {
        if self.success {
            return to_payload(&self.data);
        }
        let status = self
            .status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::BAD_REQUEST);
        let message = self
            .error
            .unwrap_or_else(|| "service reported a failure".to_owned());
        Err(Failure::new(message, status))
    }
}

/// Legacy `(data, error)` pair: an error, when present, wins.
impl<T: Serialize, E: Display> IntoServiceOutcome for (Option<T>, Option<E>) {
    fn into_service_outcome(self) -> Outcome<Value> {
        match self {
            (_, Some(error)) => Err(Failure::validation(error.to_string())),
            (data, None) => to_payload(&data),
        }
    }
}

/// Bare service value treated as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw<T>(pub T);

impl<T: Serialize> IntoServiceOutcome for Raw<T> {
    fn into_service_outcome(self) -> Outcome<Value> {
        to_payload(&self.0)
    }
}

fn to_payload<T: Serialize + ?Sized>(data: &T) -> Outcome<Value> {
    serde_json::to_value(data)
        .map_err(|error| Failure::internal(format!("service payload is not serialisable: {error}")))
}
