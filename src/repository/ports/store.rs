//! Document store port.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::outcome::Failure;
use crate::repository::domain::{
    DeleteAck, Document, DocumentId, Filter, FindOptions, ReadOptions, Update, UpdateAck,
    UpdateOptions,
};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Collection-oriented document persistence.
///
/// Every call is a single store operation. Implementations enforce unique
/// indexes on write, so a conflicting insert or update fails with
/// [`StoreError::Conflict`] rather than relying on a prior lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a new document, assigning `_id` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on a unique-index violation and
    /// [`StoreError::SchemaViolation`] when the collection schema rejects
    /// the document.
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<Document>;

    /// Finds a document by identifier.
    ///
    /// Returns `None` when no document has the identifier.
    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        options: &ReadOptions,
    ) -> StoreResult<Option<Document>>;

    /// Returns the documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidFilter`] for malformed filters.
    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    /// Applies `update` to one document.
    ///
    /// Returns `None` when no document has the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUpdate`], [`StoreError::Conflict`] or
    /// [`StoreError::SchemaViolation`] when the update cannot be applied.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        update: &Update,
        options: &UpdateOptions,
    ) -> StoreResult<Option<Document>>;

    /// Applies `update` to every document matching `filter`.
    ///
    /// Either every matching document is updated or none is.
    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateAck>;

    /// Removes one document, returning it.
    async fn delete_by_id(&self, collection: &str, id: &DocumentId)
    -> StoreResult<Option<Document>>;

    /// Removes every document matching `filter`.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<DeleteAck>;

    /// Counts the documents matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Returns `true` when at least one document matches `filter`.
    async fn exists(&self, collection: &str, filter: &Filter) -> StoreResult<bool>;

    /// Runs an aggregation pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedStage`] for stages the store does
    /// not implement.
    async fn aggregate(&self, collection: &str, pipeline: &[Value]) -> StoreResult<Vec<Value>>;
}

/// Errors returned by document stores.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A unique index already holds the value.
    #[error("duplicate value for unique field {field}: {value}")]
    Conflict {
        /// Indexed field.
        field: String,
        /// Conflicting value.
        value: String,
    },
    /// The filter could not be interpreted.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    /// The update could not be applied.
    #[error("invalid update: {0}")]
    InvalidUpdate(String),
    /// The pipeline names a stage the store does not support.
    #[error("unsupported aggregation stage: {0}")]
    UnsupportedStage(String),
    /// The collection schema rejected the document.
    #[error("document rejected: {0}")]
    SchemaViolation(String),
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<StoreError> for Failure {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { .. } => Self::conflict(error.to_string()),
            StoreError::Persistence(_) => Self::internal("the document store is unavailable"),
            StoreError::InvalidFilter(_)
            | StoreError::InvalidUpdate(_)
            | StoreError::UnsupportedStage(_)
            | StoreError::SchemaViolation(_) => Self::validation(error.to_string()),
        }
    }
}
