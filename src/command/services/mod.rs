//! Command pipeline services: the handler, its factory, CRUD wiring and the
//! registry.

pub mod crud;
pub mod factory;
mod guard;
pub mod handler;
pub mod registry;

pub use crud::{CrudMethod, CrudValidators};
pub use factory::{CREATED_MESSAGE, create_command, crud_command, query_command};
pub use handler::CommandHandler;
pub use registry::{
    CommandConfig, CommandInfo, CommandKind, CommandRegistry, CommandRoute, RegistryError,
};
