//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use conservatory::command::domain::ValidatedInput;
use conservatory::command::ports::CrudService;
use conservatory::outcome::{Failure, Outcome};
use conservatory::repository::{
    adapters::memory::InMemoryDocumentStore,
    domain::{
        Document, DocumentId, Filter, PaginatedResult, PaginationOptions, ReadOptions,
        SearchOptions, Update, UpdateOptions, decode_document,
    },
    services::BaseRepository,
};
use mockable::Clock;
use rstest::fixture;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Clock that advances one second per reading, starting at the epoch of
/// 2024-03-01.
#[derive(Debug)]
pub struct TickingClock {
    seconds: AtomicI64,
}

impl TickingClock {
    /// Creates a clock at its starting instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seconds: AtomicI64::new(1_709_251_200),
        }
    }
}

impl Default for TickingClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TickingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let seconds = self.seconds.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(seconds, 0).unwrap_or_default()
    }
}

/// Store type used throughout the integration tests.
pub type TestStore = InMemoryDocumentStore<TickingClock>;

/// Provides a fresh store with a unique index on user emails.
#[fixture]
pub fn store() -> Arc<TestStore> {
    Arc::new(
        InMemoryDocumentStore::with_clock(Arc::new(TickingClock::new()))
            .with_unique_index("users", "email"),
    )
}

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unique login address.
    pub email: String,
    /// Role name.
    pub role: String,
    /// Whether the account may sign in.
    #[serde(default)]
    pub active: bool,
}

/// Payload accepted when creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Unique login address.
    pub email: String,
    /// Role name.
    pub role: String,
    /// Whether the account may sign in.
    #[serde(default = "enabled")]
    pub active: bool,
}

const fn enabled() -> bool {
    true
}

fn to_document(value: Value) -> Outcome<Document> {
    match value {
        Value::Object(document) => Ok(document),
        _ => Err(Failure::validation("expected a JSON object")),
    }
}

/// Entity repository for the `users` collection.
#[derive(Debug, Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    /// Creates a repository over `store`.
    #[must_use]
    pub fn new(store: Arc<TestStore>) -> Self {
        Self {
            base: BaseRepository::new(store, "users"),
        }
    }

    /// Underlying generic repository.
    #[must_use]
    pub const fn base(&self) -> &BaseRepository {
        &self.base
    }

    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns 409 when the email is taken.
    pub async fn create(&self, user: &NewUser) -> Outcome<User> {
        let document = to_document(json!(user))?;
        decode_document(self.base.create(document).await?)
    }

    /// Lists users holding `role`.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list_by_role(
        &self,
        role: &str,
        options: &PaginationOptions,
    ) -> Outcome<PaginatedResult> {
        self.base.paginate(&Filter::eq("role", role), options).await
    }

    /// Searches active users by name or email.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn search_active(
        &self,
        term: &str,
        pagination: PaginationOptions,
    ) -> Outcome<PaginatedResult> {
        let options = SearchOptions::new()
            .in_fields(["name", "email"])
            .with_filter(Filter::eq("active", true))
            .with_pagination(pagination);
        self.base.search(term, &options).await
    }
}

/// Seeds `count` users named `User 01`, `User 02`, ... with role `role`.
///
/// # Errors
///
/// Returns the first failed creation.
pub async fn seed_users(
    repository: &UserRepository,
    role: &str,
    count: usize,
) -> Outcome<Vec<User>> {
    let mut created = Vec::with_capacity(count);
    for index in 1..=count {
        let user = NewUser {
            name: format!("User {index:02}"),
            email: format!("{role}{index}@conservatorio.example"),
            role: role.to_owned(),
            active: true,
        };
        created.push(repository.create(&user).await?);
    }
    Ok(created)
}

/// CRUD service over [`UserRepository`], as registered by an application.
#[derive(Debug, Clone)]
pub struct UserService {
    repository: UserRepository,
}

impl UserService {
    /// Creates the service.
    #[must_use]
    pub const fn new(repository: UserRepository) -> Self {
        Self { repository }
    }

    fn id(input: &ValidatedInput) -> Outcome<DocumentId> {
        input
            .id()
            .map(DocumentId::new)
            .ok_or_else(|| Failure::validation("missing required parameter: id"))
    }
}

#[async_trait]
impl CrudService for UserService {
    async fn list(&self, input: ValidatedInput) -> Outcome<Value> {
        let options = input.pagination()?;
        let filter = match input.query().get("role").and_then(Value::as_str) {
            Some(role) => Filter::eq("role", role),
            None => Filter::all(),
        };
        self.repository
            .base()
            .paginate(&filter, &options)
            .await?
            .to_value()
    }

    async fn get_by_id(&self, input: ValidatedInput) -> Outcome<Value> {
        let id = Self::id(&input)?;
        let document = self
            .repository
            .base()
            .find_by_id(&id, &ReadOptions::new())
            .await?;
        Ok(Value::Object(document))
    }

    async fn create(&self, input: ValidatedInput) -> Outcome<Value> {
        let payload: NewUser = input.body_as()?;
        let user = self.repository.create(&payload).await?;
        Ok(json!(user))
    }

    async fn update(&self, input: ValidatedInput) -> Outcome<Value> {
        let id = Self::id(&input)?;
        let changes = input
            .body()
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .fold(Update::new(), |update, (field, value)| {
                        update.set(field.as_str(), value.clone())
                    })
            })
            .unwrap_or_default();
        let document = self
            .repository
            .base()
            .update_by_id(&id, &changes, &UpdateOptions::default())
            .await?;
        Ok(Value::Object(document))
    }

    async fn delete(&self, input: ValidatedInput) -> Outcome<Value> {
        let id = Self::id(&input)?;
        self.repository.base().delete_by_id(&id).await?;
        Ok(json!({ "deleted": id.as_str() }))
    }
}
