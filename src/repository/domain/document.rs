//! Schemaless documents and their identifiers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// A stored JSON object.
pub type Document = Map<String, Value>;

/// Field holding the document identifier.
pub const ID_FIELD: &str = "_id";

/// Field stamped with the creation time.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Field stamped with the last modification time.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reads the identifier stored under [`ID_FIELD`].
    #[must_use]
    pub fn of(document: &Document) -> Option<Self> {
        match document.get(ID_FIELD)? {
            Value::String(id) => Some(Self(id.clone())),
            _ => None,
        }
    }

    /// Identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Self::String(id.0)
    }
}
