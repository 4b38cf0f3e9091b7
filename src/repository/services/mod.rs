//! Repository services.

pub mod base;

pub use base::BaseRepository;
