//! Role and permission enforcement with the legacy `X-API-Key` fallback.

use std::fmt;

use hmac::{
    Hmac, Mac,
    digest::{Key, KeyInit},
};
use rand::RngCore;
use sha2::Sha256;

use super::{AuthContext, Permission, Role};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time matcher for the shared API key.
///
/// Both the configured and the presented key are reduced to an HMAC-SHA256
/// digest under a per-process random key, so the final comparison always runs
/// over 32 bytes regardless of how long either input is.
#[derive(Clone)]
pub struct ApiKeyVerifier {
    mac_key: [u8; 64],
    expected: Option<Vec<u8>>,
}

impl ApiKeyVerifier {
    pub fn new(configured: Option<&str>) -> Self {
        let mut mac_key = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut mac_key);

        let expected = configured
            .filter(|key| !key.is_empty())
            .map(|key| digest(&mac_key, key).finalize().into_bytes().to_vec());

        Self { mac_key, expected }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    pub fn matches(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        let mac = digest(&self.mac_key, presented);
        match &self.expected {
            Some(expected) => mac.verify_slice(expected).is_ok(),
            None => false,
        }
    }
}

impl fmt::Debug for ApiKeyVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyVerifier")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn digest(mac_key: &[u8; 64], value: &str) -> HmacSha256 {
    let mut mac = <HmacSha256 as KeyInit>::new(Key::<HmacSha256>::from_slice(mac_key));
    mac.update(value.as_bytes());
    mac
}

#[derive(Debug, Clone)]
pub struct AuthGuard {
    api_key: ApiKeyVerifier,
}

impl AuthGuard {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            api_key: ApiKeyVerifier::new(api_key),
        }
    }

    pub fn api_key(&self) -> &ApiKeyVerifier {
        &self.api_key
    }

    pub fn require_role(
        &self,
        ctx: &AuthContext,
        required: Role,
        presented_key: Option<&str>,
    ) -> Result<(), AppError> {
        if required == Role::Public {
            return Ok(());
        }

        if let Some(user) = ctx.user() {
            if user.role.satisfies(required) {
                return Ok(());
            }
            return Err(AppError::forbidden(
                "Insufficient permissions for this operation",
            ));
        }

        if self.api_key.is_configured() {
            if self.api_key.matches(presented_key) {
                return Ok(());
            }
            return Err(AppError::unauthorized(
                "Valid API key required for this operation",
            ));
        }

        Err(AppError::unauthorized("Authentication required"))
    }

    /// A valid API key grants every permission.
    pub fn require_permission(
        &self,
        ctx: &AuthContext,
        permission: Permission,
        presented_key: Option<&str>,
    ) -> Result<(), AppError> {
        if ctx.has_permission(permission) {
            return Ok(());
        }

        if self.api_key.matches(presented_key) {
            return Ok(());
        }

        if ctx.is_authenticated() {
            return Err(AppError::forbidden(format!("Missing permission: {permission}")));
        }
        Err(AppError::unauthorized("Authentication required"))
    }
}
