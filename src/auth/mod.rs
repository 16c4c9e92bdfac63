pub mod bootstrap;
pub mod clock;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod resolver;
mod types;

pub use bootstrap::{AuthServices, build_auth_services};
pub use guard::{API_KEY_HEADER, ApiKeyVerifier, AuthGuard};
pub use jwt::{AccessToken, TokenPair, TokenPayload, TokenService, TokenType};
pub use password::{HashParams, PasswordHasher};
pub use permissions::{
    Permission, PermissionSet, RequiredPermission, permissions_for_role, permissions_for_role_name,
};
pub use resolver::{AuthContextResolver, bearer_token};
pub use types::{AdminRole, AuthContext, AuthUser, PublicRole, RequiredRole, Role};
