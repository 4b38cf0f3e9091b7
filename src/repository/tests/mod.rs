//! Unit tests for the repository module.

mod domain_tests;
