//! Port contracts for document persistence.

pub mod store;

pub use store::{DocumentStore, StoreError, StoreResult};
