//! Collection-scoped repository façade.

use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error};

use crate::outcome::{Failure, Outcome};
use crate::repository::domain::{
    DeleteAck, Document, DocumentId, Filter, FindOptions, PageInfo, PaginatedResult,
    PaginationOptions, ReadOptions, SearchOptions, Update, UpdateAck, UpdateOptions,
};
use crate::repository::ports::{DocumentStore, StoreError};

/// Generic data access for one collection.
///
/// Entity repositories wrap a `BaseRepository` and build their listings on
/// [`paginate`](Self::paginate). Every operation returns an
/// [`Outcome`]: store errors become failures (conflicts 409, persistence
/// 500, everything else 400) and missing documents become 404.
#[derive(Clone)]
pub struct BaseRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl BaseRepository {
    /// Creates a repository over `collection` of `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn store_failure(&self, operation: &str, failure: StoreError) -> Failure {
        match &failure {
            StoreError::Persistence(source) => error!(
                collection = %self.collection,
                operation,
                error = %source,
                "document store failure"
            ),
            other => debug!(
                collection = %self.collection,
                operation,
                error = %other,
                "document store rejected operation"
            ),
        }
        failure.into()
    }

    fn not_found(&self) -> Failure {
        Failure::not_found(format!("{} document not found", self.collection))
    }

    /// Stores a new document.
    ///
    /// # Errors
    ///
    /// Returns 409 on a unique-index conflict and 400 when the document is
    /// rejected.
    pub async fn create(&self, document: Document) -> Outcome<Document> {
        self.store
            .insert(&self.collection, document)
            .await
            .map_err(|failure| self.store_failure("create", failure))
    }

    /// Fetches a document by identifier.
    ///
    /// # Errors
    ///
    /// Returns 404 when no document has the identifier.
    pub async fn find_by_id(&self, id: &DocumentId, options: &ReadOptions) -> Outcome<Document> {
        self.store
            .find_by_id(&self.collection, id, options)
            .await
            .map_err(|failure| self.store_failure("find_by_id", failure))?
            .ok_or_else(|| self.not_found())
    }

    /// Fetches the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns 404 when nothing matches.
    pub async fn find_one(&self, filter: &Filter, options: &ReadOptions) -> Outcome<Document> {
        let find = FindOptions::new()
            .with_limit(1)
            .with_read(options.clone());
        self.find_many(filter, &find)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| self.not_found())
    }

    /// Fetches every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns 400 for malformed filters.
    pub async fn find_many(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Outcome<Vec<Document>> {
        self.store
            .find_many(&self.collection, filter, options)
            .await
            .map_err(|failure| self.store_failure("find_many", failure))
    }

    /// Applies `update` to one document.
    ///
    /// # Errors
    ///
    /// Returns 404 when no document has the identifier, 409 on a
    /// unique-index conflict and 400 when the update is rejected.
    pub async fn update_by_id(
        &self,
        id: &DocumentId,
        update: &Update,
        options: &UpdateOptions,
    ) -> Outcome<Document> {
        self.store
            .update_by_id(&self.collection, id, update, options)
            .await
            .map_err(|failure| self.store_failure("update_by_id", failure))?
            .ok_or_else(|| self.not_found())
    }

    /// Applies `update` to every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns 409 on a unique-index conflict and 400 when the update is
    /// rejected.
    pub async fn update_many(&self, filter: &Filter, update: &Update) -> Outcome<UpdateAck> {
        self.store
            .update_many(&self.collection, filter, update)
            .await
            .map_err(|failure| self.store_failure("update_many", failure))
    }

    /// Removes one document, returning it.
    ///
    /// # Errors
    ///
    /// Returns 404 when no document has the identifier.
    pub async fn delete_by_id(&self, id: &DocumentId) -> Outcome<Document> {
        self.store
            .delete_by_id(&self.collection, id)
            .await
            .map_err(|failure| self.store_failure("delete_by_id", failure))?
            .ok_or_else(|| self.not_found())
    }

    /// Removes every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns 400 for malformed filters.
    pub async fn delete_many(&self, filter: &Filter) -> Outcome<DeleteAck> {
        self.store
            .delete_many(&self.collection, filter)
            .await
            .map_err(|failure| self.store_failure("delete_many", failure))
    }

    /// Counts the documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns 400 for malformed filters.
    pub async fn count(&self, filter: &Filter) -> Outcome<u64> {
        self.store
            .count(&self.collection, filter)
            .await
            .map_err(|failure| self.store_failure("count", failure))
    }

    /// Returns `true` when at least one document matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns 400 for malformed filters.
    pub async fn exists(&self, filter: &Filter) -> Outcome<bool> {
        self.store
            .exists(&self.collection, filter)
            .await
            .map_err(|failure| self.store_failure("exists", failure))
    }

    /// Returns one page of the documents matching `filter`.
    ///
    /// The page and the total count are fetched concurrently; page metadata
    /// is derived from the count.
    ///
    /// # Errors
    ///
    /// Returns the first failure of either query.
    pub async fn paginate(
        &self,
        filter: &Filter,
        options: &PaginationOptions,
    ) -> Outcome<PaginatedResult> {
        let find = options.find_options();
        let (documents, total) = tokio::join!(self.find_many(filter, &find), self.count(filter));
        let pagination = PageInfo::compute(options.page(), options.limit(), total?);
        Ok(PaginatedResult {
            documents: documents?,
            pagination,
        })
    }

    /// Searches for `term`, returning one page of matches.
    ///
    /// With search fields, each field is matched case-insensitively against
    /// the literal term; otherwise the store's text search is used. A blank
    /// term lists every document matching the extra filter.
    ///
    /// # Errors
    ///
    /// Returns the failure of the underlying [`paginate`](Self::paginate).
    pub async fn search(&self, term: &str, options: &SearchOptions) -> Outcome<PaginatedResult> {
        let needle = term.trim();
        let matcher = if needle.is_empty() {
            Filter::all()
        } else if options.fields.is_empty() {
            Filter::eq("$text", json!({ "$search": needle }))
        } else {
            let pattern = regex::escape(needle);
            Filter::any_of(options.fields.iter().map(|field| {
                Filter::eq(field.as_str(), json!({ "$regex": pattern, "$options": "i" }))
            }))
        };
        let filter = matcher.merge(options.filter.clone());
        self.paginate(&filter, &options.pagination).await
    }

    /// Runs an aggregation pipeline.
    ///
    /// # Errors
    ///
    /// Returns 400 for unsupported or malformed stages.
    pub async fn aggregate(&self, pipeline: &[Value]) -> Outcome<Vec<Value>> {
        self.store
            .aggregate(&self.collection, pipeline)
            .await
            .map_err(|failure| self.store_failure("aggregate", failure))
    }
}

impl fmt::Debug for BaseRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseRepository")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}
