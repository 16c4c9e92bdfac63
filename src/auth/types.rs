use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permissions::{Permission, PermissionSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Public,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Public => "public",
            Role::Admin => "admin",
        }
    }

    /// Position in the role hierarchy; a higher rank satisfies every lower one.
    pub fn rank(self) -> u8 {
        match self {
            Role::Public => 0,
            Role::Admin => 1,
        }
    }

    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// Reads a role column value, degrading unknown values to `Public`.
    pub fn from_stored(value: &str) -> Role {
        value.parse().unwrap_or(Role::Public)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "public" => Ok(Role::Public),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

pub trait RequiredRole {
    fn required() -> Role;
}

pub struct PublicRole;

impl RequiredRole for PublicRole {
    fn required() -> Role {
        Role::Public
    }
}

pub struct AdminRole;

impl RequiredRole for AdminRole {
    fn required() -> Role {
        Role::Admin
    }
}

/// Snapshot of the caller taken from the live user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Authenticated {
        user: AuthUser,
        permissions: PermissionSet,
    },
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    pub fn authenticated(user: AuthUser, permissions: PermissionSet) -> Self {
        Self::Authenticated { user, permissions }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user, .. } => Some(user),
        }
    }

    pub fn permissions(&self) -> PermissionSet {
        match self {
            Self::Anonymous => PermissionSet::empty(),
            Self::Authenticated { permissions, .. } => *permissions,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{AdminRole, AuthContext, AuthUser, PublicRole, RequiredRole, Role};
    use crate::auth::permissions::{Permission, permissions_for_role};

    #[test]
    fn role_string_roundtrip() {
        assert_eq!(Role::Public.as_str(), "public");
        assert_eq!(Role::Admin.as_str(), "admin");

        assert_eq!("public".parse::<Role>(), Ok(Role::Public));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn unknown_stored_role_reads_as_public() {
        assert_eq!(Role::from_stored("manager"), Role::Public);
        assert_eq!(Role::from_stored("admin"), Role::Admin);
    }

    #[test]
    fn admin_outranks_public() {
        assert!(Role::Admin.satisfies(Role::Public));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Public.satisfies(Role::Public));
        assert!(!Role::Public.satisfies(Role::Admin));
    }

    #[test]
    fn required_role_markers_map_to_expected_role() {
        assert_eq!(PublicRole::required(), Role::Public);
        assert_eq!(AdminRole::required(), Role::Admin);
    }

    #[test]
    fn anonymous_context_has_no_permissions() {
        let ctx = AuthContext::anonymous();

        assert!(!ctx.is_authenticated());
        assert!(ctx.user().is_none());
        assert!(!ctx.has_permission(Permission::LeagueRead));
    }

    #[test]
    fn authenticated_context_exposes_user_and_permissions() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            role: Role::Public,
            display_name: "Alice".to_string(),
        };
        let ctx = AuthContext::authenticated(user.clone(), permissions_for_role(Role::Public));

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user(), Some(&user));
        assert!(ctx.has_permission(Permission::RaceRead));
        assert!(!ctx.has_permission(Permission::RaceDelete));
    }
}
