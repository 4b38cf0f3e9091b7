//! Domain types for the command subsystem.
//!
//! These types are transport agnostic: the HTTP layer builds a
//! [`CommandRequest`] and consumes a [`CommandResponse`]; nothing here knows
//! about sockets or wire formats.

mod identity;
mod input;
mod request;
mod response;

pub use identity::{Identity, ParseRoleError, Role};
pub use input::{Channel, ValidatedInput};
pub use request::{CommandRequest, UploadedFile};
pub use response::CommandResponse;
