//! Generic document repository.
//!
//! Entity services reach persistence through [`services::BaseRepository`],
//! which wraps one collection of a [`ports::DocumentStore`] and adds
//! pagination, search and not-found handling on top of it. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The repository façade in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
