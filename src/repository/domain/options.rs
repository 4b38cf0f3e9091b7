//! Read, write, pagination and search options.

use serde_json::Value;

use super::query::{Filter, Populate, Projection, Sort, SortDirection};
use crate::outcome::{Failure, Outcome};

/// Largest page size a listing may request.
pub const MAX_PAGE_LIMIT: u64 = 100;

const DEFAULT_PAGE_LIMIT: u64 = 10;
const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Options for reading single documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadOptions {
    /// References to resolve.
    pub populate: Vec<Populate>,
    /// Field selection.
    pub select: Option<Projection>,
}

impl ReadOptions {
    /// Creates options that return documents as stored.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves an additional reference.
    #[must_use]
    pub fn with_populate(mut self, populate: Populate) -> Self {
        self.populate.push(populate);
        self
    }

    /// Sets the field selection.
    #[must_use]
    pub fn with_select(mut self, projection: Projection) -> Self {
        self.select = Some(projection);
        self
    }
}

/// Options for multi-document reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FindOptions {
    /// Result order; empty keeps insertion order.
    pub sort: Sort,
    /// Documents skipped before the first result.
    pub skip: u64,
    /// Maximum number of results.
    pub limit: Option<u64>,
    /// References and field selection.
    pub read: ReadOptions,
}

impl FindOptions {
    /// Creates options returning every match in natural order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the result order.
    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Skips the first `skip` matches.
    #[must_use]
    pub const fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Returns at most `limit` matches.
    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets references and field selection.
    #[must_use]
    pub fn with_read(mut self, read: ReadOptions) -> Self {
        self.read = read;
        self
    }
}

/// Options for single-document updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Return the document after the update instead of before it.
    pub return_new: bool,
    /// Re-check the collection schema against the updated document.
    pub run_validators: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            return_new: true,
            run_validators: true,
        }
    }
}

/// Page request for listings.
///
/// `page` is at least 1 and `limit` lies between 1 and
/// [`MAX_PAGE_LIMIT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    page: u64,
    limit: u64,
    sort: Sort,
    read: ReadOptions,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort: Sort::descending(DEFAULT_SORT_FIELD),
            read: ReadOptions::default(),
        }
    }
}

impl PaginationOptions {
    /// Creates a page request, clamping out-of-range values.
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            ..Self::default()
        }
    }

    /// Builds a page request from query parameters.
    ///
    /// Reads `page`, `limit`, `sort`, `order` and `select`; numeric
    /// parameters may be numbers or decimal strings. Absent parameters take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns a validation failure when a parameter is out of range or has
    /// the wrong type.
    ///
    /// # Examples
    ///
    /// ```
    /// use conservatory::repository::domain::PaginationOptions;
    /// use serde_json::json;
    ///
    /// let options = PaginationOptions::from_query(&json!({"page": "3", "limit": 20})).unwrap();
    /// assert_eq!((options.page(), options.limit(), options.skip()), (3, 20, 40));
    /// assert!(PaginationOptions::from_query(&json!({"limit": 500})).is_err());
    /// ```
    pub fn from_query(query: &Value) -> Outcome<Self> {
        let defaults = Self::default();
        if query.is_null() {
            return Ok(defaults);
        }
        if !query.is_object() {
            return Err(Failure::validation("query must be an object"));
        }

        let page = read_count(query, "page")?.unwrap_or(defaults.page);
        if page < 1 {
            return Err(Failure::validation(
                "page must be greater than or equal to 1",
            ));
        }
        let limit = read_count(query, "limit")?.unwrap_or(defaults.limit);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(Failure::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }

        let direction = match query.get("order") {
            None | Some(Value::Null) => SortDirection::Descending,
            Some(order) => SortDirection::from_value(order)
                .ok_or_else(|| Failure::validation("order must be one of: asc, desc"))?,
        };
        let sort = match query.get("sort").and_then(Value::as_str).map(str::trim) {
            Some(field) if !field.is_empty() => Sort::new().by(field, direction),
            _ => Sort::new().by(DEFAULT_SORT_FIELD, direction),
        };
        let select = query
            .get("select")
            .and_then(Value::as_str)
            .map(Projection::parse);

        Ok(Self {
            page,
            limit,
            sort,
            read: ReadOptions {
                populate: Vec::new(),
                select,
            },
        })
    }

    /// Replaces the sort order.
    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Resolves an additional reference on every listed document.
    #[must_use]
    pub fn with_populate(mut self, populate: Populate) -> Self {
        self.read.populate.push(populate);
        self
    }

    /// Sets the field selection.
    #[must_use]
    pub fn with_select(mut self, projection: Projection) -> Self {
        self.read.select = Some(projection);
        self
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of documents before this page.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Sort order.
    #[must_use]
    pub const fn sort(&self) -> &Sort {
        &self.sort
    }

    /// References and field selection.
    #[must_use]
    pub const fn read(&self) -> &ReadOptions {
        &self.read
    }

    /// Equivalent multi-document read options.
    #[must_use]
    pub fn find_options(&self) -> FindOptions {
        FindOptions {
            sort: self.sort.clone(),
            skip: self.skip(),
            limit: Some(self.limit),
            read: self.read.clone(),
        }
    }
}

fn read_count(query: &Value, key: &str) -> Outcome<Option<u64>> {
    match query.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(value) => Ok(Some(u64::try_from(value).unwrap_or(0))),
            None => Err(Failure::validation(format!("{key} must be an integer"))),
        },
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(|value| Some(u64::try_from(value).unwrap_or(0)))
            .map_err(|_| Failure::validation(format!("{key} must be an integer"))),
        Some(_) => Err(Failure::validation(format!("{key} must be an integer"))),
    }
}

/// Free-text search over a collection.
///
/// With `fields`, each field is matched case-insensitively against the
/// literal term; without, the store's text search is used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOptions {
    /// Fields matched against the term.
    pub fields: Vec<String>,
    /// Extra conditions every result must satisfy.
    pub filter: Filter,
    /// Page request.
    pub pagination: PaginationOptions,
}

impl SearchOptions {
    /// Creates options using text search and the default page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches the term against `fields`.
    #[must_use]
    pub fn in_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts results to documents matching `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the page request.
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationOptions) -> Self {
        self.pagination = pagination;
        self
    }
}
