//! Success/failure algebra shared by every layer of the dispatch core.
//!
//! Validators, services, repositories and handlers all speak [`Outcome`], a
//! plain [`Result`] whose error side is a [`Failure`] carrying an HTTP status
//! and a human-readable message. The native `Result` API provides `map`,
//! `and_then` and pattern matching; [`OutcomeExt`] adds folding, fallible and
//! asynchronous mapping, while the free functions in this module convert
//! fallible operations and combine collections of outcomes.

mod combinators;
mod failure;

pub use combinators::{
    OutcomeExt, all, any, failure, failure_with_status, from_async_fallible, from_fallible,
    from_future, success,
};
pub use failure::{ErrorKind, Failure};

/// Result type produced by every validator, service and repository call.
pub type Outcome<T> = Result<T, Failure>;
