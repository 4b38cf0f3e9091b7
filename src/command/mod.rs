//! Command dispatch for HTTP-triggered operations.
//!
//! Every operation the backend exposes runs through the same pipeline:
//! validate the request channels, invoke a domain service, normalise its
//! outcome and emit exactly one response. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Declarative request validation in [`validation`]
//! - Adapter implementations in [`adapters`]
//! - Handler, factory and registry services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
pub mod validation;

#[cfg(test)]
mod tests;
