//! Declarative request validation.
//!
//! Channel rules are [`Schema`](crate::command::ports::Schema)s; validators
//! compose them with identity, file and pagination checks. Every validator
//! reports the first failure it finds.

mod auth;
mod channels;
mod combined;
mod crud;
mod file;
mod query;
mod schema;

pub use auth::AuthValidator;
pub use channels::{ChannelSchemas, SchemaValidator, validate};
pub use combined::{CombinedValidator, combine_validators};
pub use crud::CrudValidator;
pub use file::{FileOptions, FileValidator};
pub use query::QueryValidator;
pub use schema::{FieldRule, ObjectSchema, TypedSchema, UnknownKeys};
