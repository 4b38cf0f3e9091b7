//! Conservatory: command dispatch and document repository core.
//!
//! This crate provides the request pipeline and data-access layer shared by
//! every administrative operation of the music-school backend: validating
//! request channels, invoking domain services, answering with a single
//! response, and paging through document collections.
//!
//! # Architecture
//!
//! Conservatory follows hexagonal architecture principles:
//!
//! - **Domain**: Pure request, response and document types
//! - **Ports**: Abstract trait interfaces for validators, services, the
//!   transport and the document store
//! - **Adapters**: Concrete implementations of ports (in-memory store,
//!   capturing response sink)
//!
//! # Modules
//!
//! - [`outcome`]: Success/failure algebra used by every layer
//! - [`command`]: Validation, handlers and the command registry
//! - [`repository`]: Generic repository façade over a document store
//! - [`config`]: Deserialisable configuration with defaults
//! - [`telemetry`]: Tracing subscriber bootstrap

pub mod command;
pub mod config;
pub mod outcome;
pub mod repository;
pub mod telemetry;
