//! Stateless access decisions. Nothing here touches storage or caches a
//! verdict: callers resolve ownership and the actor's current role, then ask.

use super::{Account, Operation, Permission, Resource, RoleKind, Scope};
use crate::error::AppError;

/// How the actor relates to the row being acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    NotOwner,
}

impl Ownership {
    pub fn of(is_owner: bool) -> Self {
        if is_owner {
            Ownership::Owner
        } else {
            Ownership::NotOwner
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

pub fn decide(
    kind: Option<RoleKind>,
    resource: Resource,
    operation: Operation,
    ownership: Ownership,
) -> Decision {
    let permissions = RoleKind::permissions_for(kind);

    let any = Permission {
        resource,
        operation,
        scope: Scope::Any,
    };
    let own = Permission {
        scope: Scope::Own,
        ..any
    };

    let allowed = permissions.contains(&any)
        || (ownership == Ownership::Owner && permissions.contains(&own));

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

impl Account {
    pub fn can(&self, resource: Resource, operation: Operation, ownership: Ownership) -> bool {
        decide(self.role.kind, resource, operation, ownership) == Decision::Allow
    }

    pub fn require(
        &self,
        resource: Resource,
        operation: Operation,
        ownership: Ownership,
    ) -> Result<(), AppError> {
        if self.can(resource, operation, ownership) {
            Ok(())
        } else {
            tracing::warn!(
                account_id = self.id,
                role = %self.role.name,
                resource = %resource,
                operation = %operation,
                ownership = ?ownership,
                "Permission denied"
            );
            Err(AppError::Unauthorized(format!(
                "{} may not {} {}",
                self.role.name, operation, resource
            )))
        }
    }
}
