//! Per-channel schema validation.

use std::fmt;
use std::sync::Arc;

use crate::command::domain::{Channel, CommandRequest, ValidatedInput};
use crate::command::ports::{Schema, Validator};
use crate::outcome::{Failure, Outcome};

/// Optional schemas for the body, params and query channels.
#[derive(Clone, Default)]
pub struct ChannelSchemas {
    body: Option<Arc<dyn Schema>>,
    params: Option<Arc<dyn Schema>>,
    query: Option<Arc<dyn Schema>>,
}

impl ChannelSchemas {
    /// Creates an empty rule set; every channel passes through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body schema.
    #[must_use]
    pub fn with_body(mut self, schema: impl Schema + 'static) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    /// Sets the path-parameter schema.
    #[must_use]
    pub fn with_params(mut self, schema: impl Schema + 'static) -> Self {
        self.params = Some(Arc::new(schema));
        self
    }

    /// Sets the query schema.
    #[must_use]
    pub fn with_query(mut self, schema: impl Schema + 'static) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    /// Sets the schema for `channel` from a shared handle.
    #[must_use]
    pub fn with_shared(mut self, channel: Channel, schema: Arc<dyn Schema>) -> Self {
        *self.slot_mut(channel) = Some(schema);
        self
    }

    /// Returns the schema registered for `channel`.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&Arc<dyn Schema>> {
        match channel {
            Channel::Body => self.body.as_ref(),
            Channel::Params => self.params.as_ref(),
            Channel::Query => self.query.as_ref(),
        }
    }

    /// Returns `true` when no channel has a schema.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.body.is_none() && self.params.is_none() && self.query.is_none()
    }

    const fn slot_mut(&mut self, channel: Channel) -> &mut Option<Arc<dyn Schema>> {
        match channel {
            Channel::Body => &mut self.body,
            Channel::Params => &mut self.params,
            Channel::Query => &mut self.query,
        }
    }
}

impl fmt::Debug for ChannelSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSchemas")
            .field("body", &self.body.is_some())
            .field("params", &self.params.is_some())
            .field("query", &self.query.is_some())
            .finish()
    }
}

/// Validates the request channels against `schemas`.
///
/// Channels run in body, params, query order. The first violation becomes
/// a 400 failure reading `error in <channel>: <reason>`; channels without a
/// schema pass through unchanged.
///
/// # Errors
///
/// Returns a validation failure for the first channel that is rejected.
///
/// # Examples
///
/// ```
/// use conservatory::command::domain::CommandRequest;
/// use conservatory::command::validation::{ChannelSchemas, FieldRule, ObjectSchema, validate};
/// use serde_json::json;
///
/// let schemas = ChannelSchemas::new()
///     .with_body(ObjectSchema::new().field("title", FieldRule::string().required()));
/// let request = CommandRequest::new().with_body(json!({}));
/// let failure = validate(&request, &schemas).unwrap_err();
/// assert_eq!(failure.message(), "error in body: title is required");
/// ```
pub fn validate(request: &CommandRequest, schemas: &ChannelSchemas) -> Outcome<ValidatedInput> {
    let mut input = ValidatedInput::from_request(request);
    for channel in Channel::ALL {
        let Some(schema) = schemas.get(channel) else {
            continue;
        };
        let validated = schema
            .validate(request.channel(channel))
            .map_err(|violation| Failure::validation(format!("error in {channel}: {violation}")))?;
        input.set_channel(channel, validated);
    }
    Ok(input)
}

/// [`Validator`] running a fixed set of channel schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    schemas: ChannelSchemas,
}

impl SchemaValidator {
    /// Creates a validator over `schemas`.
    #[must_use]
    pub const fn new(schemas: ChannelSchemas) -> Self {
        Self { schemas }
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput> {
        validate(request, &self.schemas)
    }
}
