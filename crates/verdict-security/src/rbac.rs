//! Role-based access control
//!
//! Static `(role, action)` matrix; anything outside it denies.
//!
//! | Role     | create | approve | view | register_model |
//! |----------|--------|---------|------|----------------|
//! | ADMIN    | yes    | yes     | yes  | yes            |
//! | ANALYST  | yes    | no      | yes  | no             |
//! | APPROVER | no     | yes     | yes  | no             |
//! | VIEWER   | no     | no      | yes  | no             |

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use verdict_types::error::{Result, VerdictError};

/// Caller roles known to the permission matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full access
    Admin,
    /// Creates and views
    Analyst,
    /// Approves and views
    Approver,
    /// Views only
    Viewer,
}

impl Role {
    /// Uppercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Analyst => "ANALYST",
            Role::Approver => "APPROVER",
            Role::Viewer => "VIEWER",
        }
    }
}

static GRANTS: Lazy<HashSet<(Role, &'static str)>> = Lazy::new(|| {
    HashSet::from([
        (Role::Admin, "create"),
        (Role::Admin, "approve"),
        (Role::Admin, "view"),
        (Role::Admin, "register_model"),
        (Role::Analyst, "create"),
        (Role::Analyst, "view"),
        (Role::Approver, "approve"),
        (Role::Approver, "view"),
        (Role::Viewer, "view"),
    ])
});

/// Fail with [`VerdictError::Authorization`] unless the matrix grants
/// `action` to `role`. Unknown actions deny by default.
pub fn check_permission(role: Role, action: &str) -> Result<()> {
    if GRANTS.contains(&(role, action)) {
        Ok(())
    } else {
        Err(VerdictError::Authorization(format!(
            "Role {} does not have permission for action '{action}'",
            role.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_grants() {
        check_permission(Role::Admin, "register_model").unwrap();
        check_permission(Role::Analyst, "create").unwrap();
        check_permission(Role::Approver, "approve").unwrap();
        check_permission(Role::Viewer, "view").unwrap();
    }

    #[test]
    fn matrix_denials() {
        assert!(check_permission(Role::Analyst, "approve").is_err());
        assert!(check_permission(Role::Approver, "create").is_err());
        assert!(check_permission(Role::Viewer, "approve").is_err());
        assert!(check_permission(Role::Viewer, "register_model").is_err());
    }

    #[test]
    fn unknown_action_denies_by_default() {
        assert!(check_permission(Role::Admin, "delete_everything").is_err());
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Approver).unwrap(), "\"APPROVER\"");
    }
}
