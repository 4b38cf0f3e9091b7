//! Authenticated identity attached to a request by the transport layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Roles recognised by the administration backend.
///
/// # Examples
///
/// ```
/// use conservatory::command::domain::Role;
///
/// let role: Role = "profesor".parse().expect("known role");
/// assert_eq!(role, Role::Profesor);
/// assert_eq!(Role::Admin.to_string(), "admin");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Site administrator.
    Admin,
    /// Teacher managing classes and materials.
    Profesor,
    /// Enrolled student.
    Estudiante,
}

impl Role {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Profesor => "profesor",
            Self::Estudiante => "estudiante",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "profesor" => Ok(Self::Profesor),
            "estudiante" => Ok(Self::Estudiante),
            _ => Err(ParseRoleError(s.to_owned())),
        }
    }
}

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: String,
    roles: Vec<Role>,
}

impl Identity {
    /// Creates an identity with the given roles.
    #[must_use]
    pub fn new(id: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id: id.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// Identifier of the authenticated user.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Roles held by the user.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns `true` when the identity holds at least one of `accepted`.
    #[must_use]
    pub fn has_any_role(&self, accepted: &[Role]) -> bool {
        self.roles.iter().any(|role| accepted.contains(role))
    }
}
