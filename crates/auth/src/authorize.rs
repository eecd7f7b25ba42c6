use thiserror::Error;

use crate::{Permission, UserProfile};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),
}

impl AuthzError {
    /// The permission that would have granted access, if any.
    pub fn missing_permission(&self) -> Option<&Permission> {
        match self {
            AuthzError::Unauthenticated => None,
            AuthzError::Forbidden(p) => Some(p),
        }
    }
}

/// Authorize the current operator for an optional required permission.
///
/// - No IO
/// - No panics
/// - `required == None` means "any signed-in operator"
/// - an absent operator is always denied
pub fn authorize(user: Option<&UserProfile>, required: Option<&Permission>) -> Result<(), AuthzError> {
    let Some(user) = user else {
        return Err(AuthzError::Unauthenticated);
    };

    match required {
        None => Ok(()),
        Some(permission) if user.role.grants(permission) => Ok(()),
        Some(permission) => {
            tracing::debug!(user_id = %user.id, role = %user.role, %permission, "permission denied");
            Err(AuthzError::Forbidden(permission.clone()))
        }
    }
}

/// `user is present AND (permission is absent OR permission ∈ user.role.meta)`.
///
/// Every enforcement surface goes through this.
pub fn has_permission(user: Option<&UserProfile>, permission: Option<&Permission>) -> bool {
    authorize(user, permission).is_ok()
}
