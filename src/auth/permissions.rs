//! Permission checks for API handlers.
//!
//! Admins hold every permission. Everyone else holds the `*Own` operations
//! only, so handlers pair `has_permission` with an ownership check on the
//! record itself.

use crate::{
    api::models::users::CurrentUser,
    errors::{Error, Result},
    types::{Operation, Permission, Resource},
};

/// Whether the user holds the given permission.
pub fn has_permission(user: &CurrentUser, _resource: Resource, operation: Operation) -> bool {
    if user.is_admin {
        return true;
    }

    matches!(
        operation,
        Operation::CreateOwn | Operation::ReadOwn | Operation::UpdateOwn | Operation::DeleteOwn
    )
}

/// Require the given permission, or fail with 403.
pub fn require_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<()> {
    if has_permission(user, resource, operation) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Allow(resource, operation),
            action: operation,
            resource: resource.to_string(),
        })
    }
}

/// Require an admin user, or fail with 403.
pub fn require_admin(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Allow(resource, operation),
            action: operation,
            resource: resource.to_string(),
        })
    }
}
