//! Validated request channels handed to domain services.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

use super::CommandRequest;
use crate::outcome::{Failure, Outcome};
use crate::repository::domain::PaginationOptions;

/// One of the three inbound request partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Request body.
    Body,
    /// Path parameters.
    Params,
    /// Query-string parameters.
    Query,
}

impl Channel {
    /// Channels in validation order.
    pub const ALL: [Self; 3] = [Self::Body, Self::Params, Self::Query];

    /// Lowercase channel name used in failure messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Params => "params",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request channels after validation and coercion.
///
/// Channels without a rule carry the raw request value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput {
    body: Value,
    params: Value,
    query: Value,
}

impl ValidatedInput {
    /// Creates validated input from explicit channel values.
    #[must_use]
    pub const fn new(body: Value, params: Value, query: Value) -> Self {
        Self {
            body,
            params,
            query,
        }
    }

    /// Copies the raw channels of `request` without validation.
    #[must_use]
    pub fn from_request(request: &CommandRequest) -> Self {
        Self::new(
            request.body().clone(),
            request.params().clone(),
            request.query().clone(),
        )
    }

    /// Validated body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Validated path parameters.
    #[must_use]
    pub const fn params(&self) -> &Value {
        &self.params
    }

    /// Validated query parameters.
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

    /// Replaces the named channel.
    pub fn set_channel(&mut self, channel: Channel, value: Value) {
        match channel {
            Channel::Body => self.body = value,
            Channel::Params => self.params = value,
            Channel::Query => self.query = value,
        }
    }

    /// Consumes the input, returning `(body, params, query)`.
    #[must_use]
    pub fn into_parts(self) -> (Value, Value, Value) {
        (self.body, self.params, self.query)
    }

    /// Returns the `id` path parameter as text.
    ///
    /// Numeric identifiers are rendered in decimal.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.params.get("id")? {
            Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Builds pagination options from the validated query channel.
    ///
    /// # Errors
    ///
    /// Returns a validation failure when `page`, `limit`, `sort` or `order`
    /// hold unusable values.
    pub fn pagination(&self) -> Outcome<PaginationOptions> {
        PaginationOptions::from_query(&self.query)
    }

    /// Deserialises the body into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns a validation failure when the body does not match `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Outcome<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|error| Failure::validation(format!("error in body: {error}")))
    }
}
