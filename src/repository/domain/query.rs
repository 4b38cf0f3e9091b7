//! Typed wrappers over the document query vocabulary.
//!
//! Filters and updates use the familiar operator syntax (`$gt`, `$in`,
//! `$set`, `$inc`, ...). The wrappers keep that syntax as JSON so callers
//! can build arbitrary expressions, and add builders for the common cases.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::document::{DocumentId, ID_FIELD};
use crate::outcome::Failure;

/// Document filter.
///
/// # Examples
///
/// ```
/// use conservatory::repository::domain::Filter;
/// use serde_json::json;
///
/// let filter = Filter::eq("role", "profesor").and("active", true);
/// assert_eq!(filter.into_value(), json!({"role": "profesor", "active": true}));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    /// Matches every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches documents whose `field` equals `value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    /// Matches the document with the given identifier.
    #[must_use]
    pub fn by_id(id: &DocumentId) -> Self {
        Self::eq(ID_FIELD, id.as_str())
    }

    /// Matches documents satisfying at least one of `filters`.
    #[must_use]
    pub fn any_of(filters: impl IntoIterator<Item = Self>) -> Self {
        let clauses: Vec<Value> = filters.into_iter().map(Self::into_value).collect();
        Self::all().and("$or", clauses)
    }

    /// Adds a condition on `field`, replacing any previous one.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, condition: impl Into<Value>) -> Self {
        self.0.insert(field.into(), condition.into());
        self
    }

    /// Combines two filters so that both must hold.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::all().and("$and", json!([self.into_value(), other.into_value()]))
    }

    /// Returns `true` when the filter matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Filter clauses.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts the filter into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(clauses: Map<String, Value>) -> Self {
        Self(clauses)
    }
}

impl TryFrom<Value> for Filter {
    type Error = Failure;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(clauses) => Ok(Self(clauses)),
            Value::Null => Ok(Self::all()),
            _ => Err(Failure::validation("filter must be a JSON object")),
        }
    }
}

/// Document update.
///
/// Fields given without an operator are treated as `$set`.
///
/// # Examples
///
/// ```
/// use conservatory::repository::domain::Update;
/// use serde_json::json;
///
/// let update = Update::new().set("title", "Scales").inc("views", 1);
/// assert_eq!(
///     update.into_value(),
///     json!({"$set": {"title": "Scales"}, "$inc": {"views": 1}})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Update(Map<String, Value>);

impl Update {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn operator(mut self, operator: &str, field: impl Into<String>, value: Value) -> Self {
        let entry = self
            .0
            .entry(operator.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(fields) = entry {
            fields.insert(field.into(), value);
        }
        self
    }

    /// Sets `field` to `value`.
    #[must_use]
    pub fn set(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.operator("$set", field, value.into())
    }

    /// Removes `field`.
    #[must_use]
    pub fn unset(self, field: impl Into<String>) -> Self {
        self.operator("$unset", field, Value::String(String::new()))
    }

    /// Adds `amount` to the numeric `field`, creating it when absent.
    #[must_use]
    pub fn inc(self, field: impl Into<String>, amount: impl Into<Value>) -> Self {
        self.operator("$inc", field, amount.into())
    }

    /// Appends `value` to the array `field`, creating it when absent.
    #[must_use]
    pub fn push(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.operator("$push", field, value.into())
    }

    /// Returns `true` when the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Update clauses.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts the update into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Update {
    fn from(clauses: Map<String, Value>) -> Self {
        Self(clauses)
    }
}

impl TryFrom<Value> for Update {
    type Error = Failure;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(clauses) => Ok(Self(clauses)),
            _ => Err(Failure::validation("update must be a JSON object")),
        }
    }
}

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    #[default]
    Descending,
}

impl SortDirection {
    /// Parses `asc`/`desc` (any case) or `1`/`-1`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(Self::Ascending),
            "desc" | "descending" | "-1" => Some(Self::Descending),
            _ => None,
        }
    }

    /// Reads a direction from a JSON number or string.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => match number.as_i64()? {
                1 => Some(Self::Ascending),
                -1 => Some(Self::Descending),
                _ => None,
            },
            Value::String(text) => Self::parse(text),
            _ => None,
        }
    }
}

/// Ordered sort keys; earlier keys take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort(Vec<(String, SortDirection)>);

impl Sort {
    /// Creates an empty sort, preserving natural order.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a key.
    #[must_use]
    pub fn by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.0.push((field.into(), direction));
        self
    }

    /// Sort by a single key, smallest first.
    #[must_use]
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new().by(field, SortDirection::Ascending)
    }

    /// Sort by a single key, largest first.
    #[must_use]
    pub fn descending(field: impl Into<String>) -> Self {
        Self::new().by(field, SortDirection::Descending)
    }

    /// Sort keys in precedence order.
    #[must_use]
    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.0
    }

    /// Returns `true` when no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Field selection applied to returned documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Keep only these fields (and `_id`).
    Include(Vec<String>),
    /// Drop these fields.
    Exclude(Vec<String>),
}

impl Projection {
    /// Parses a selection such as `"name email"` or `"-password"`.
    ///
    /// Fields are separated by spaces or commas. When any field carries a
    /// leading `-`, the whole selection is an exclusion.
    #[must_use]
    pub fn parse(selection: &str) -> Self {
        let fields: Vec<&str> = selection
            .split(|separator: char| separator == ',' || separator.is_whitespace())
            .filter(|field| !field.is_empty())
            .collect();
        let strip = |field: &&str| field.trim_start_matches('-').to_owned();
        if fields.iter().any(|field| field.starts_with('-')) {
            Self::Exclude(fields.iter().map(strip).collect())
        } else {
            Self::Include(fields.iter().map(strip).collect())
        }
    }
}

/// Replaces a reference field with the referenced document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Populate {
    path: String,
    collection: String,
    select: Option<Projection>,
}

impl Populate {
    /// Resolves the identifiers at `path` against `collection`.
    #[must_use]
    pub fn new(path: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            collection: collection.into(),
            select: None,
        }
    }

    /// Applies `projection` to the referenced documents.
    #[must_use]
    pub fn with_select(mut self, projection: Projection) -> Self {
        self.select = Some(projection);
        self
    }

    /// Reference field path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Referenced collection.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Projection for referenced documents.
    #[must_use]
    pub const fn select(&self) -> Option<&Projection> {
        self.select.as_ref()
    }
}
