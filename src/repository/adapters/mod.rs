//! Adapter implementations of the document store port.

pub mod memory;
