//! Object schemas built from per-field rules.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::marker::PhantomData;
use std::sync::OnceLock;

use regex::Regex;

use crate::command::ports::{Schema, SchemaViolation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    String,
    Email,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

/// Rule applied to a single object field.
///
/// Query strings arrive as text, so integer, number and boolean rules
/// accept their textual forms and coerce them.
///
/// # Examples
///
/// ```
/// use conservatory::command::validation::{FieldRule, ObjectSchema};
/// use conservatory::command::ports::Schema;
/// use serde_json::json;
///
/// let schema = ObjectSchema::new()
///     .field("page", FieldRule::integer().min(1).default_value(1));
/// assert_eq!(schema.validate(&json!({"page": "3"})), Ok(json!({"page": 3})));
/// assert_eq!(schema.validate(&json!({})), Ok(json!({"page": 1})));
/// assert!(schema.validate(&json!({"page": "0"})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    kind: FieldKind,
    required: bool,
    default: Option<Value>,
    min: Option<i64>,
    max: Option<i64>,
    allowed: Vec<Value>,
    trim: bool,
}

impl FieldRule {
    const fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            min: None,
            max: None,
            allowed: Vec::new(),
            trim: false,
        }
    }

    /// Text value; `min`/`max` bound its length in characters.
    #[must_use]
    pub const fn string() -> Self {
        Self::of(FieldKind::String)
    }

    /// E-mail address, trimmed and lowercased.
    #[must_use]
    pub const fn email() -> Self {
        Self::of(FieldKind::Email)
    }

    /// Integer value; `min`/`max` bound it inclusively.
    #[must_use]
    pub const fn integer() -> Self {
        Self::of(FieldKind::Integer)
    }

    /// Any JSON number.
    #[must_use]
    pub const fn number() -> Self {
        Self::of(FieldKind::Number)
    }

    /// Boolean value.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    /// Array value; `min`/`max` bound its length.
    #[must_use]
    pub const fn array() -> Self {
        Self::of(FieldKind::Array)
    }

    /// Nested object value.
    #[must_use]
    pub const fn object() -> Self {
        Self::of(FieldKind::Object)
    }

    /// Any value.
    #[must_use]
    pub const fn any() -> Self {
        Self::of(FieldKind::Any)
    }

    /// Rejects absent or null values.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Substitutes `value` when the field is absent or null.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Inclusive lower bound (value or length, depending on the kind).
    #[must_use]
    pub const fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound (value or length, depending on the kind).
    #[must_use]
    pub const fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    /// Restricts the field to an explicit set of values.
    #[must_use]
    pub fn one_of<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    /// Trims surrounding whitespace from text values.
    #[must_use]
    pub const fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Checks a field value, returning the coerced value or `None` when an
    /// optional field is absent.
    fn check(&self, name: &str, value: Option<&Value>) -> Result<Option<Value>, SchemaViolation> {
        let present = value.filter(|candidate| !candidate.is_null());
        let Some(raw) = present else {
            if let Some(default) = &self.default {
                return Ok(Some(default.clone()));
            }
            if self.required {
                return Err(SchemaViolation::new(format!("{name} is required")));
            }
            return Ok(None);
        };

        let coerced = self.coerce(name, raw)?;
        self.check_bounds(name, &coerced)?;
        if !self.allowed.is_empty() && !self.allowed.contains(&coerced) {
            let accepted = self
                .allowed
                .iter()
                .map(display_value)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(SchemaViolation::new(format!(
                "{name} must be one of: {accepted}"
            )));
        }
        Ok(Some(coerced))
    }

    fn coerce(&self, name: &str, raw: &Value) -> Result<Value, SchemaViolation> {
        match self.kind {
            FieldKind::String => match raw {
                Value::String(text) if self.trim => Ok(Value::String(text.trim().to_owned())),
                Value::String(_) => Ok(raw.clone()),
                _ => Err(type_error(name, "a string")),
            },
            FieldKind::Email => coerce_email(name, raw),
            FieldKind::Integer => coerce_integer(name, raw),
            FieldKind::Number => coerce_number(name, raw),
            FieldKind::Boolean => coerce_boolean(name, raw),
            FieldKind::Array if raw.is_array() => Ok(raw.clone()),
            FieldKind::Array => Err(type_error(name, "an array")),
            FieldKind::Object if raw.is_object() => Ok(raw.clone()),
            FieldKind::Object => Err(type_error(name, "an object")),
            FieldKind::Any => Ok(raw.clone()),
        }
    }

    fn check_bounds(&self, name: &str, value: &Value) -> Result<(), SchemaViolation> {
        match (self.kind, value) {
            (FieldKind::Integer, Value::Number(number)) => {
                let Some(actual) = number.as_i64() else {
                    return Err(type_error(name, "an integer"));
                };
                if let Some(min) = self.min.filter(|min| actual < *min) {
                    return Err(SchemaViolation::new(format!(
                        "{name} must be greater than or equal to {min}"
                    )));
                }
                if let Some(max) = self.max.filter(|max| actual > *max) {
                    return Err(SchemaViolation::new(format!(
                        "{name} must be less than or equal to {max}"
                    )));
                }
                Ok(())
            }
            (FieldKind::String | FieldKind::Email, Value::String(text)) => {
                self.check_length(name, text.chars().count(), "characters long")
            }
            (FieldKind::Array, Value::Array(items)) => {
                self.check_length(name, items.len(), "items")
            }
            _ => Ok(()),
        }
    }

    fn check_length(&self, name: &str, length: usize, unit: &str) -> Result<(), SchemaViolation> {
        let actual = i64::try_from(length).unwrap_or(i64::MAX);
        if let Some(min) = self.min.filter(|min| actual < *min) {
            return Err(SchemaViolation::new(format!(
                "{name} must be at least {min} {unit}"
            )));
        }
        if let Some(max) = self.max.filter(|max| actual > *max) {
            return Err(SchemaViolation::new(format!(
                "{name} must be at most {max} {unit}"
            )));
        }
        Ok(())
    }
}

fn type_error(name: &str, expected: &str) -> SchemaViolation {
    SchemaViolation::new(format!("{name} must be {expected}"))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Dot-separated atoms before the `@`; hostname labels after it, at least two.
        let pattern = concat!(
            r"^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
            r"@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?",
            r"(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
        );
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn coerce_email(name: &str, raw: &Value) -> Result<Value, SchemaViolation> {
    let Value::String(text) = raw else {
        return Err(type_error(name, "a string"));
    };
    let address = text.trim().to_lowercase();
    if email_regex().is_match(&address) {
        Ok(Value::String(address))
    } else {
        Err(type_error(name, "a valid email address"))
    }
}

fn coerce_integer(name: &str, raw: &Value) -> Result<Value, SchemaViolation> {
    match raw {
        Value::Number(number) if number.is_i64() => Ok(raw.clone()),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| type_error(name, "an integer")),
        _ => Err(type_error(name, "an integer")),
    }
}

fn coerce_number(name: &str, raw: &Value) -> Result<Value, SchemaViolation> {
    match raw {
        Value::Number(_) => Ok(raw.clone()),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| type_error(name, "a number")),
        _ => Err(type_error(name, "a number")),
    }
}

fn coerce_boolean(name: &str, raw: &Value) -> Result<Value, SchemaViolation> {
    match raw {
        Value::Bool(_) => Ok(raw.clone()),
        Value::String(text) => match text.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(type_error(name, "a boolean")),
        },
        _ => Err(type_error(name, "a boolean")),
    }
}

/// Policy for keys that have no rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Keep unknown keys unchanged.
    #[default]
    Allow,
    /// Drop unknown keys from the output.
    Strip,
    /// Reject the value.
    Deny,
}

/// Schema for a JSON object described field by field.
///
/// Fields are checked in declaration order; the first violation wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldRule)>,
    unknown: UnknownKeys,
}

impl ObjectSchema {
    /// Creates an empty schema that allows unknown keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field rule.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((name.into(), rule));
        self
    }

    /// Sets the policy for keys without a rule.
    #[must_use]
    pub const fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown = policy;
        self
    }

    fn is_declared(&self, key: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == key)
    }
}

impl Schema for ObjectSchema {
    fn validate(&self, value: &Value) -> Result<Value, SchemaViolation> {
        let empty = Map::new();
        let input = match value {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(SchemaViolation::new("value must be an object")),
        };

        if self.unknown == UnknownKeys::Deny
            && let Some(key) = input.keys().find(|key| !self.is_declared(key))
        {
            return Err(SchemaViolation::new(format!("{key} is not allowed")));
        }

        let mut output = match self.unknown {
            UnknownKeys::Allow => input.clone(),
            UnknownKeys::Strip | UnknownKeys::Deny => Map::new(),
        };
        for (name, rule) in &self.fields {
            match rule.check(name, input.get(name))? {
                Some(checked) => {
                    output.insert(name.clone(), checked);
                }
                None => {
                    output.remove(name);
                }
            }
        }
        Ok(Value::Object(output))
    }
}

/// Schema that round-trips a value through a typed payload.
///
/// Deserialisation errors become violations; the output is the payload
/// serialised back, so serde defaults and renames apply.
pub struct TypedSchema<T> {
    payload: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Creates a typed schema.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            payload: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedSchema")
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize,
{
    fn validate(&self, value: &Value) -> Result<Value, SchemaViolation> {
        let payload: T = serde_json::from_value(value.clone())
            .map_err(|error| SchemaViolation::new(error.to_string()))?;
        serde_json::to_value(&payload).map_err(|error| SchemaViolation::new(error.to_string()))
    }
}
