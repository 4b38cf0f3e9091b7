//! Thread-safe in-memory document store.

use async_trait::async_trait;
use chrono::SecondsFormat;
use mockable::{Clock, DefaultClock};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::ordering::{equal, sort_documents};
use super::filter::Matcher;
use super::{aggregate, path, projection, update};
use crate::command::ports::Schema;
use crate::repository::domain::{
    CREATED_AT_FIELD, DeleteAck, Document, DocumentId, Filter, FindOptions, ID_FIELD, Populate,
    Projection, ReadOptions, UPDATED_AT_FIELD, Update, UpdateAck, UpdateOptions,
};
use crate::repository::ports::{DocumentStore, StoreError, StoreResult};

type Collections = HashMap<String, Vec<Document>>;

const RESERVED_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// In-memory [`DocumentStore`].
///
/// Collections are created on first write and keep insertion order.
/// Identifiers are UUID v4 strings; `createdAt` and `updatedAt` are
/// RFC 3339 timestamps taken from the injected clock. Every write holds the
/// store lock for its whole duration, so unique-index checks and the write
/// itself are atomic.
///
/// # Examples
///
/// ```
/// use conservatory::repository::adapters::memory::InMemoryDocumentStore;
/// use conservatory::repository::ports::DocumentStore;
/// use serde_json::json;
///
/// let store = InMemoryDocumentStore::new().with_unique_index("users", "email");
/// # tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(async {
/// let user = json!({"email": "ana@example.com"}).as_object().cloned().expect("object");
/// store.insert("users", user.clone()).await.expect("first insert succeeds");
/// assert!(store.insert("users", user).await.is_err());
/// # });
/// ```
pub struct InMemoryDocumentStore<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    collections: Arc<RwLock<Collections>>,
    unique_indexes: Arc<HashMap<String, Vec<String>>>,
    schemas: Arc<HashMap<String, Arc<dyn Schema>>>,
    clock: Arc<C>,
}

impl InMemoryDocumentStore<DefaultClock> {
    /// Creates an empty store stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryDocumentStore<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for InMemoryDocumentStore<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            collections: Arc::clone(&self.collections),
            unique_indexes: Arc::clone(&self.unique_indexes),
            schemas: Arc::clone(&self.schemas),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> fmt::Debug for InMemoryDocumentStore<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("unique_indexes", &self.unique_indexes)
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn poisoned(err: impl fmt::Display) -> StoreError {
    StoreError::persistence(std::io::Error::other(err.to_string()))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn matching(documents: &[Document], filter: &Filter) -> StoreResult<Vec<usize>> {
    let matcher = Matcher::compile(filter.as_map())?;
    let mut positions = Vec::new();
    for (position, document) in documents.iter().enumerate() {
        if matcher.matches(document)? {
            positions.push(position);
        }
    }
    Ok(positions)
}

fn position_of(documents: &[Document], id: &DocumentId) -> Option<usize> {
    documents
        .iter()
        .position(|document| document.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str()))
}

fn saturating_count(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

fn select(document: &Document, projection: Option<&Projection>) -> StoreResult<Document> {
    projection.map_or_else(
        || Ok(document.clone()),
        |fields| projection::apply(document, fields),
    )
}

fn populate(
    collections: &Collections,
    document: &mut Document,
    spec: &Populate,
) -> StoreResult<()> {
    let Some(reference) = path::get(document, spec.path()).cloned() else {
        return Ok(());
    };
    let related = collections
        .get(spec.collection())
        .map(Vec::as_slice)
        .unwrap_or_default();
    let resolve = |id: &Value| -> StoreResult<Option<Document>> {
        related
            .iter()
            .find(|candidate| equal(candidate.get(ID_FIELD), Some(id)))
            .map(|found| select(found, spec.select()))
            .transpose()
    };
    let resolved = match &reference {
        Value::Null => Value::Null,
        Value::Array(ids) => {
            let mut found = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(related_document) = resolve(id)? {
                    found.push(Value::Object(related_document));
                }
            }
            Value::Array(found)
        }
        id => resolve(id)?.map_or(Value::Null, Value::Object),
    };
    path::set(document, spec.path(), resolved)
}

fn present(
    collections: &Collections,
    document: &Document,
    options: &ReadOptions,
) -> StoreResult<Document> {
    let mut populated = document.clone();
    for spec in &options.populate {
        populate(collections, &mut populated, spec)?;
    }
    select(&populated, options.select.as_ref())
}

impl<C> InMemoryDocumentStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store using `clock` for timestamps.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            unique_indexes: Arc::new(HashMap::new()),
            schemas: Arc::new(HashMap::new()),
            clock,
        }
    }

    /// Rejects writes that would give two documents of `collection` the
    /// same non-null `field` value.
    #[must_use]
    pub fn with_unique_index(
        mut self,
        collection: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.unique_indexes)
            .entry(collection.into())
            .or_default()
            .push(field.into());
        self
    }

    /// Checks documents of `collection` against `schema` on insert and on
    /// updates that run validators.
    ///
    /// The schema sees the document without `_id` and timestamps and its
    /// output is what gets stored.
    #[must_use]
    pub fn with_schema(
        mut self,
        collection: impl Into<String>,
        schema: impl Schema + 'static,
    ) -> Self {
        Arc::make_mut(&mut self.schemas).insert(collection.into(), Arc::new(schema));
        self
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.collections.read().map_err(poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.collections.write().map_err(poisoned)
    }

    fn timestamp(&self) -> Value {
        Value::String(self.clock.utc().to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    fn apply_schema(&self, collection: &str, document: Document) -> StoreResult<Document> {
        let Some(schema) = self.schemas.get(collection) else {
            return Ok(document);
        };
        let mut content = document.clone();
        for field in RESERVED_FIELDS {
            content.remove(field);
        }
        let validated = schema
            .validate(&Value::Object(content))
            .map_err(|violation| StoreError::SchemaViolation(violation.to_string()))?;
        let Value::Object(mut accepted) = validated else {
            return Err(StoreError::SchemaViolation(
                "schema must produce an object".to_owned(),
            ));
        };
        for field in RESERVED_FIELDS {
            if let Some(value) = document.get(field) {
                accepted.insert(field.to_owned(), value.clone());
            }
        }
        Ok(accepted)
    }

    fn check_unique(
        &self,
        collection: &str,
        documents: &[Document],
        candidate: &Document,
        skip: Option<usize>,
    ) -> StoreResult<()> {
        let indexed = self
            .unique_indexes
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let fields = std::iter::once(ID_FIELD).chain(indexed.iter().map(String::as_str));
        for field in fields {
            let Some(value) = path::get(candidate, field).filter(|value| !value.is_null()) else {
                continue;
            };
            let taken = documents
                .iter()
                .enumerate()
                .filter(|(position, _)| Some(*position) != skip)
                .any(|(_, existing)| equal(path::get(existing, field), Some(value)));
            if taken {
                return Err(StoreError::Conflict {
                    field: field.to_owned(),
                    value: display_value(value),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<C> DocumentStore for InMemoryDocumentStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<Document> {
        let mut stored = self.apply_schema(collection, document)?;
        match stored.get(ID_FIELD) {
            None | Some(Value::Null) => {
                stored.insert(ID_FIELD.to_owned(), DocumentId::generate().into());
            }
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(StoreError::SchemaViolation(
                    "_id must be a string".to_owned(),
                ));
            }
        }
        let now = self.timestamp();
        stored.insert(CREATED_AT_FIELD.to_owned(), now.clone());
        stored.insert(UPDATED_AT_FIELD.to_owned(), now);

        let mut collections = self.write()?;
        let documents = collections.entry(collection.to_owned()).or_default();
        self.check_unique(collection, documents, &stored, None)?;
        documents.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        options: &ReadOptions,
    ) -> StoreResult<Option<Document>> {
        let collections = self.read()?;
        let Some(documents) = collections.get(collection) else {
            return Ok(None);
        };
        position_of(documents, id)
            .and_then(|position| documents.get(position))
            .map(|document| present(&collections, document, options))
            .transpose()
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.read()?;
        let documents = collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut found: Vec<Document> = matching(documents, filter)?
            .into_iter()
            .filter_map(|position| documents.get(position).cloned())
            .collect();
        sort_documents(&mut found, &options.sort);

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        found
            .iter()
            .skip(skip)
            .take(limit)
            .map(|document| present(&collections, document, &options.read))
            .collect()
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        update: &Update,
        options: &UpdateOptions,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.write()?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(position) = position_of(documents, id) else {
            return Ok(None);
        };
        let Some(current) = documents.get(position).cloned() else {
            return Ok(None);
        };

        let applied = update::apply(&current, update.as_map())?;
        let mut next = if options.run_validators {
            self.apply_schema(collection, applied)?
        } else {
            applied
        };
        next.insert(UPDATED_AT_FIELD.to_owned(), self.timestamp());
        self.check_unique(collection, documents, &next, Some(position))?;

        if let Some(slot) = documents.get_mut(position) {
            slot.clone_from(&next);
        }
        Ok(Some(if options.return_new { next } else { current }))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateAck> {
        let mut collections = self.write()?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(UpdateAck::default());
        };
        let positions = matching(documents, filter)?;
        let mut staged = documents.clone();
        let mut modified = 0_usize;
        for position in &positions {
            let Some(slot) = staged.get_mut(*position) else {
                continue;
            };
            let applied = update::apply(slot, update.as_map())?;
            let mut next = self.apply_schema(collection, applied)?;
            if next != *slot {
                modified = modified.saturating_add(1);
                next.insert(UPDATED_AT_FIELD.to_owned(), self.timestamp());
            }
            *slot = next;
        }
        for position in &positions {
            if let Some(candidate) = staged.get(*position) {
                self.check_unique(collection, &staged, candidate, Some(*position))?;
            }
        }
        *documents = staged;
        Ok(UpdateAck {
            matched_count: saturating_count(positions.len()),
            modified_count: saturating_count(modified),
        })
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.write()?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Ok(position_of(documents, id).map(|position| documents.remove(position)))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<DeleteAck> {
        let mut collections = self.write()?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(DeleteAck::default());
        };
        let positions = matching(documents, filter)?;
        let mut index = 0_usize;
        documents.retain(|_| {
            let keep = !positions.contains(&index);
            index = index.saturating_add(1);
            keep
        });
        Ok(DeleteAck {
            deleted_count: saturating_count(positions.len()),
        })
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let collections = self.read()?;
        let documents = collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(saturating_count(matching(documents, filter)?.len()))
    }

    async fn exists(&self, collection: &str, filter: &Filter) -> StoreResult<bool> {
        let collections = self.read()?;
        let documents = collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let matcher = Matcher::compile(filter.as_map())?;
        for document in documents {
            if matcher.matches(document)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn aggregate(&self, collection: &str, pipeline: &[Value]) -> StoreResult<Vec<Value>> {
        let collections = self.read()?;
        let documents = collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        aggregate::run(&collections, documents, pipeline)
    }
}
