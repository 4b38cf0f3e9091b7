//! In-memory document store.
//!
//! Evaluates the filter, update, projection and aggregation vocabulary
//! against documents held in process memory. Used by tests, demos and
//! embedded deployments.

mod aggregate;
mod filter;
mod ordering;
mod path;
mod projection;
mod store;
mod update;

pub use store::InMemoryDocumentStore;
