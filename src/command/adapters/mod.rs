//! Adapter implementations of the command ports.

pub mod capture;

pub use capture::CapturedResponse;
