//! In-memory integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `pagination_tests`: Page windows and metadata over the repository
//! - `search_tests`: Field and text search with extra filters
//! - `registry_flow_tests`: Requests dispatched through registered CRUD commands

mod in_memory {
    pub mod helpers;

    mod pagination_tests;
    mod registry_flow_tests;
    mod search_tests;
}
