//! Inbound request model consumed by validators and handlers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Channel, Identity, ValidatedInput};

/// Metadata for a file attached to a request.
///
/// File bytes stay with the transport; validators only inspect metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    file_name: String,
    mime_type: String,
    size_bytes: u64,
}

impl UploadedFile {
    /// Creates file metadata.
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    /// Original file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Declared MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// A request as seen by the dispatch core.
///
/// The three channels default to empty JSON objects.
///
/// # Examples
///
/// ```
/// use conservatory::command::domain::CommandRequest;
/// use serde_json::json;
///
/// let request = CommandRequest::new()
///     .with_param("id", "42")
///     .with_query_param("page", "2");
/// assert_eq!(request.params()["id"], json!("42"));
/// assert_eq!(request.body(), &json!({}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    body: Value,
    params: Value,
    query: Value,
    identity: Option<Identity>,
    file: Option<UploadedFile>,
}

impl CommandRequest {
    /// Creates a request with empty channels and no identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            body: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
            identity: None,
            file: None,
        }
    }

    /// Replaces the body channel.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Replaces the path-parameter channel.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Sets a single path parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        insert_entry(&mut self.params, key.into(), value.into());
        self
    }

    /// Replaces the query-parameter channel.
    #[must_use]
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Sets a single query parameter.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        insert_entry(&mut self.query, key.into(), value.into());
        self
    }

    /// Attaches an authenticated identity.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Attaches file metadata.
    #[must_use]
    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Returns a copy whose channels are replaced by validated values.
    ///
    /// Identity and file metadata are carried over unchanged.
    #[must_use]
    pub fn with_validated(&self, input: &ValidatedInput) -> Self {
        Self {
            body: input.body().clone(),
            params: input.params().clone(),
            query: input.query().clone(),
            identity: self.identity.clone(),
            file: self.file.clone(),
        }
    }

    /// Body channel.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Path-parameter channel.
    #[must_use]
    pub const fn params(&self) -> &Value {
        &self.params
    }

    /// Query-parameter channel.
    #[must_use]
    pub const fn query(&self) -> &Value {
        &self.query
    }

    /// Returns the named channel.
    #[must_use]
    pub const fn channel(&self, channel: Channel) -> &Value {
        match channel {
            Channel::Body => &self.body,
            Channel::Params => &self.params,
            Channel::Query => &self.query,
        }
    }

    /// Authenticated identity, when present.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Attached file metadata, when present.
    #[must_use]
    pub const fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }
}

impl Default for CommandRequest {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_entry(target: &mut Value, key: String, value: Value) {
    if let Value::Object(map) = target {
        map.insert(key, value);
        return;
    }
    let mut map = Map::new();
    map.insert(key, value);
    *target = Value::Object(map);
}
