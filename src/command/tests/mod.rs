//! Unit tests for the command module.
//!
//! Tests are organised by pipeline stage: request validation, the command
//! handler and its service adapters, and the registry.

mod fixtures;
mod registry_tests;
