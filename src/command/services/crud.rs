//! Wiring between [`CrudService`] implementations and command handlers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::command::domain::ValidatedInput;
use crate::command::ports::{CrudOperation, CrudService, ServiceMethod, Validator};
use crate::command::validation::{CrudValidator, QueryValidator};
use crate::outcome::Outcome;

/// One operation of a [`CrudService`] exposed as a [`ServiceMethod`].
pub struct CrudMethod<S: ?Sized> {
    service: Arc<S>,
    operation: CrudOperation,
}

impl<S: ?Sized> CrudMethod<S> {
    /// Binds `operation` of `service`.
    #[must_use]
    pub const fn new(service: Arc<S>, operation: CrudOperation) -> Self {
        Self { service, operation }
    }

    /// Bound operation.
    #[must_use]
    pub const fn operation(&self) -> CrudOperation {
        self.operation
    }
}

impl<S: ?Sized> fmt::Debug for CrudMethod<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudMethod")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S> ServiceMethod for CrudMethod<S>
where
    S: CrudService + ?Sized,
{
    async fn call(&self, input: ValidatedInput) -> Outcome<Value> {
        match self.operation {
            CrudOperation::List => self.service.list(input).await,
            CrudOperation::GetById => self.service.get_by_id(input).await,
            CrudOperation::Create => self.service.create(input).await,
            CrudOperation::Update => self.service.update(input).await,
            CrudOperation::Delete => self.service.delete(input).await,
        }
    }
}

/// Validators used when registering the five CRUD commands of an entity.
///
/// By default `list` runs a [`QueryValidator`], `getById`, `update` and
/// `delete` run a [`CrudValidator`], and `create` is not validated.
#[derive(Clone)]
pub struct CrudValidators {
    list: Option<Arc<dyn Validator>>,
    get_by_id: Option<Arc<dyn Validator>>,
    create: Option<Arc<dyn Validator>>,
    update: Option<Arc<dyn Validator>>,
    delete: Option<Arc<dyn Validator>>,
}

impl Default for CrudValidators {
    fn default() -> Self {
        let by_id: Arc<dyn Validator> = Arc::new(CrudValidator::new());
        Self {
            list: Some(Arc::new(QueryValidator::new())),
            get_by_id: Some(Arc::clone(&by_id)),
            create: None,
            update: Some(Arc::clone(&by_id)),
            delete: Some(by_id),
        }
    }
}

impl CrudValidators {
    /// Creates the default validator set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set with no validators at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            list: None,
            get_by_id: None,
            create: None,
            update: None,
            delete: None,
        }
    }

    /// Replaces the validator for `operation`.
    #[must_use]
    pub fn with(mut self, operation: CrudOperation, validator: impl Validator + 'static) -> Self {
        *self.slot_mut(operation) = Some(Arc::new(validator));
        self
    }

    /// Removes the validator for `operation`.
    #[must_use]
    pub fn without(mut self, operation: CrudOperation) -> Self {
        *self.slot_mut(operation) = None;
        self
    }

    /// Validator configured for `operation`.
    #[must_use]
    pub fn get(&self, operation: CrudOperation) -> Option<Arc<dyn Validator>> {
        match operation {
            CrudOperation::List => self.list.clone(),
            CrudOperation::GetById => self.get_by_id.clone(),
            CrudOperation::Create => self.create.clone(),
            CrudOperation::Update => self.update.clone(),
            CrudOperation::Delete => self.delete.clone(),
        }
    }

    const fn slot_mut(&mut self, operation: CrudOperation) -> &mut Option<Arc<dyn Validator>> {
        match operation {
            CrudOperation::List => &mut self.list,
            CrudOperation::GetById => &mut self.get_by_id,
            CrudOperation::Create => &mut self.create,
            CrudOperation::Update => &mut self.update,
            CrudOperation::Delete => &mut self.delete,
        }
    }
}

impl fmt::Debug for CrudValidators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudValidators")
            .field("list", &self.list.is_some())
            .field("get_by_id", &self.get_by_id.is_some())
            .field("create", &self.create.is_some())
            .field("update", &self.update.is_some())
            .field("delete", &self.delete.is_some())
            .finish()
    }
}
