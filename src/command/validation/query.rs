//! Validator for listing commands driven by query parameters.

use std::sync::Arc;

use serde_json::Value;

use crate::command::domain::{Channel, CommandRequest, ValidatedInput};
use crate::command::ports::{Schema, Validator};
use crate::config::PaginationConfig;
use crate::outcome::{Failure, Outcome};

use super::schema::{FieldRule, ObjectSchema, UnknownKeys};

/// Coerces pagination parameters and applies an optional extra query schema.
///
/// `page` is an integer of at least 1 (default 1), `limit` an integer
/// between 1 and the configured maximum (default from
/// [`PaginationConfig`], capped at
/// [`MAX_PAGE_LIMIT`](crate::repository::domain::MAX_PAGE_LIMIT)),
/// `sort` defaults to `createdAt` and `order` is `asc` or `desc` (default
/// `desc`). Fields produced by the extra schema
/// are merged in, with the pagination fields taking precedence.
///
/// # Examples
///
/// ```
/// use conservatory::command::domain::CommandRequest;
/// use conservatory::command::ports::Validator;
/// use conservatory::command::validation::QueryValidator;
/// use serde_json::json;
///
/// let request = CommandRequest::new().with_query(json!({"page": "2"}));
/// let input = QueryValidator::new().validate(&request).unwrap();
/// assert_eq!(
///     input.query(),
///     &json!({"page": 2, "limit": 10, "sort": "createdAt", "order": "desc"})
/// );
/// ```
#[derive(Clone)]
pub struct QueryValidator {
    pagination: ObjectSchema,
    extra: Option<Arc<dyn Schema>>,
}

impl QueryValidator {
    /// Creates a validator with the default pagination limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&PaginationConfig::default())
    }

    /// Creates a validator using the limits in `config`.
    #[must_use]
    pub fn with_config(config: &PaginationConfig) -> Self {
        let pagination = ObjectSchema::new()
            .unknown_keys(UnknownKeys::Strip)
            .field("page", FieldRule::integer().min(1).default_value(1))
            .field(
                "limit",
                FieldRule::integer()
                    .min(1)
                    .max(i64::from(config.effective_max_limit()))
                    .default_value(config.effective_default_limit()),
            )
            .field(
                "sort",
                FieldRule::string()
                    .trimmed()
                    .min(1)
                    .default_value(config.default_sort.clone()),
            )
            .field(
                "order",
                FieldRule::string().one_of(["asc", "desc"]).default_value("desc"),
            );
        Self {
            pagination,
            extra: None,
        }
    }

    /// Adds a schema for entity-specific query parameters.
    #[must_use]
    pub fn with_extra(mut self, schema: impl Schema + 'static) -> Self {
        self.extra = Some(Arc::new(schema));
        self
    }

    fn check(&self, schema: &dyn Schema, query: &Value) -> Outcome<Value> {
        schema
            .validate(query)
            .map_err(|violation| Failure::validation(format!("error in query: {violation}")))
    }
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryValidator")
            .field("pagination", &self.pagination)
            .field("extra", &self.extra.is_some())
            .finish()
    }
}

impl Validator for QueryValidator {
    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput> {
        let pagination = self.check(&self.pagination, request.query())?;
        let mut merged = match &self.extra {
            Some(extra) => self.check(extra.as_ref(), request.query())?,
            None => request.query().clone(),
        };
        match (&mut merged, pagination) {
            (Value::Object(target), Value::Object(fields)) => target.extend(fields),
            (target, fields) => *target = fields,
        }
        let mut input = ValidatedInput::from_request(request);
        input.set_channel(Channel::Query, merged);
        Ok(input)
    }
}
