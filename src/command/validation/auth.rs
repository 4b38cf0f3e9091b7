//! Identity and role gate layered over channel validation.

use crate::command::domain::{CommandRequest, Role, ValidatedInput};
use crate::command::ports::Validator;
use crate::outcome::{Failure, Outcome};

use super::channels::{ChannelSchemas, validate};

/// Validates the channels, then requires an identity holding an accepted
/// role.
///
/// Channel failures are reported before authentication failures. An empty
/// role list accepts any authenticated identity.
///
/// # Examples
///
/// ```
/// use conservatory::command::domain::{CommandRequest, Identity, Role};
/// use conservatory::command::ports::Validator;
/// use conservatory::command::validation::{AuthValidator, ChannelSchemas};
/// use http::StatusCode;
///
/// let validator = AuthValidator::new(ChannelSchemas::new()).require_roles([Role::Admin]);
/// let student = CommandRequest::new().with_identity(Identity::new("u1", [Role::Estudiante]));
/// let failure = validator.validate(&student).unwrap_err();
/// assert_eq!(failure.status(), StatusCode::FORBIDDEN);
/// assert_eq!(failure.message(), "access denied: requires one of the roles: admin");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthValidator {
    schemas: ChannelSchemas,
    roles: Vec<Role>,
}

impl AuthValidator {
    /// Creates a validator that requires authentication only.
    #[must_use]
    pub const fn new(schemas: ChannelSchemas) -> Self {
        Self {
            schemas,
            roles: Vec::new(),
        }
    }

    /// Restricts access to identities holding at least one of `roles`.
    #[must_use]
    pub fn require_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    fn denied_message(&self) -> String {
        let accepted = self
            .roles
            .iter()
            .map(|role| role.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("access denied: requires one of the roles: {accepted}")
    }
}

impl Validator for AuthValidator {
    fn validate(&self, request: &CommandRequest) -> Outcome<ValidatedInput> {
        let input = validate(request, &self.schemas)?;
        let identity = request
            .identity()
            .ok_or_else(|| Failure::unauthenticated("authentication required"))?;
        if !self.roles.is_empty() && !identity.has_any_role(&self.roles) {
            return Err(Failure::forbidden(self.denied_message()));
        }
        Ok(input)
    }
}
