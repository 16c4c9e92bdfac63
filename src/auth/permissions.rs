//! Fine-grained `resource:action` permissions and the fixed role mapping.

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use super::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    LeagueRead,
    LeagueCreate,
    LeagueUpdate,
    LeagueDelete,
    SeasonRead,
    SeasonCreate,
    DriverRead,
    DriverCreate,
    DriverUpdate,
    DriverDelete,
    RaceRead,
    RaceCreate,
    RaceUpdate,
    RaceDelete,
}

impl Permission {
    pub const ALL: [Permission; 14] = [
        Permission::LeagueRead,
        Permission::LeagueCreate,
        Permission::LeagueUpdate,
        Permission::LeagueDelete,
        Permission::SeasonRead,
        Permission::SeasonCreate,
        Permission::DriverRead,
        Permission::DriverCreate,
        Permission::DriverUpdate,
        Permission::DriverDelete,
        Permission::RaceRead,
        Permission::RaceCreate,
        Permission::RaceUpdate,
        Permission::RaceDelete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::LeagueRead => "league:read",
            Permission::LeagueCreate => "league:create",
            Permission::LeagueUpdate => "league:update",
            Permission::LeagueDelete => "league:delete",
            Permission::SeasonRead => "season:read",
            Permission::SeasonCreate => "season:create",
            Permission::DriverRead => "driver:read",
            Permission::DriverCreate => "driver:create",
            Permission::DriverUpdate => "driver:update",
            Permission::DriverDelete => "driver:delete",
            Permission::RaceRead => "race:read",
            Permission::RaceCreate => "race:create",
            Permission::RaceUpdate => "race:update",
            Permission::RaceDelete => "race:delete",
        }
    }

    pub fn resource(self) -> &'static str {
        self.split().0
    }

    pub fn action(self) -> &'static str {
        self.split().1
    }

    pub fn is_read(self) -> bool {
        self.action() == "read"
    }

    fn split(self) -> (&'static str, &'static str) {
        self.as_str().split_once(':').unwrap_or((self.as_str(), ""))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|permission| permission.as_str() == raw)
            .ok_or_else(|| format!("unknown permission: {raw}"))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

const PUBLIC_PERMISSIONS: &[Permission] = &[
    Permission::LeagueRead,
    Permission::SeasonRead,
    Permission::DriverRead,
    Permission::RaceRead,
];

const ADMIN_PERMISSIONS: &[Permission] = &Permission::ALL;

/// Immutable view over one of the static role permission tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet(&'static [Permission]);

impl PermissionSet {
    pub const fn empty() -> Self {
        Self(&[])
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

pub fn permissions_for_role(role: Role) -> PermissionSet {
    match role {
        Role::Public => PermissionSet(PUBLIC_PERMISSIONS),
        Role::Admin => PermissionSet(ADMIN_PERMISSIONS),
    }
}

/// Lookup by stored role name. Unknown names get the public set.
pub fn permissions_for_role_name(role: &str) -> PermissionSet {
    permissions_for_role(Role::from_stored(role))
}

/// Compile-time permission requirement for route extractors.
pub trait RequiredPermission {
    fn required() -> Permission;
}

macro_rules! permission_markers {
    ($($marker:ident => $permission:ident),* $(,)?) => {
        $(
            pub struct $marker;

            impl RequiredPermission for $marker {
                fn required() -> Permission {
                    Permission::$permission
                }
            }
        )*
    };
}

permission_markers! {
    CanReadLeague => LeagueRead,
    CanCreateLeague => LeagueCreate,
    CanUpdateLeague => LeagueUpdate,
    CanDeleteLeague => LeagueDelete,
    CanReadSeason => SeasonRead,
    CanCreateSeason => SeasonCreate,
    CanReadDriver => DriverRead,
    CanCreateDriver => DriverCreate,
    CanUpdateDriver => DriverUpdate,
    CanDeleteDriver => DriverDelete,
    CanReadRace => RaceRead,
    CanCreateRace => RaceCreate,
    CanUpdateRace => RaceUpdate,
    CanDeleteRace => RaceDelete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_set_is_read_only() {
        let public = permissions_for_role(Role::Public);

        assert!(!public.is_empty());
        assert!(public.iter().all(Permission::is_read));
        for permission in Permission::ALL.into_iter().filter(|p| !p.is_read()) {
            assert!(!public.contains(permission), "public must not have {permission}");
        }
    }

    #[test]
    fn public_set_has_every_read_permission() {
        let public = permissions_for_role(Role::Public);
        let reads = Permission::ALL.into_iter().filter(|p| p.is_read()).count();

        assert_eq!(public.len(), reads);
    }

    #[test]
    fn admin_set_has_everything() {
        let admin = permissions_for_role(Role::Admin);

        assert_eq!(admin.len(), Permission::ALL.len());
        assert!(Permission::ALL.into_iter().all(|p| admin.contains(p)));
    }

    #[test]
    fn unknown_role_name_falls_back_to_public() {
        assert_eq!(
            permissions_for_role_name("superuser"),
            permissions_for_role(Role::Public)
        );
        assert_eq!(
            permissions_for_role_name("admin"),
            permissions_for_role(Role::Admin)
        );
    }

    #[test]
    fn permission_names_follow_resource_action() {
        assert_eq!(Permission::RaceDelete.as_str(), "race:delete");
        assert_eq!(Permission::RaceDelete.resource(), "race");
        assert_eq!(Permission::RaceDelete.action(), "delete");
        assert_eq!("league:read".parse::<Permission>(), Ok(Permission::LeagueRead));
        assert!("league:archive".parse::<Permission>().is_err());
    }

    #[test]
    fn markers_map_to_their_permission() {
        assert_eq!(CanDeleteRace::required(), Permission::RaceDelete);
        assert_eq!(CanReadLeague::required(), Permission::LeagueRead);
    }

    #[test]
    fn permission_set_serializes_as_strings() {
        let json = serde_json::to_value(permissions_for_role(Role::Public))
            .expect("permission set should serialize");
        assert_eq!(
            json,
            serde_json::json!(["league:read", "season:read", "driver:read", "race:read"])
        );
    }
}
