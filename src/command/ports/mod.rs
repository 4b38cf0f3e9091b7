//! Port contracts for command dispatch.
//!
//! Ports define the seams between the dispatch pipeline and its
//! collaborators: request validators and schemas, domain services, and the
//! transport that receives responses.

pub mod service;
pub mod transport;
pub mod validator;

pub use service::{
    CrudOperation, CrudService, DataTransformer, IntoServiceOutcome, Raw, ServiceFn,
    ServiceMethod, ServiceRecord, TransformFn, service_fn, transform_fn,
};
pub use transport::{RequestHandler, ResponseSink};
pub use validator::{Schema, SchemaViolation, Validator};
