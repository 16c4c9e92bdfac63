//! Per-request "who is calling". Every failure degrades to anonymous.

use axum::http::{HeaderMap, header};
use uuid::Uuid;

use super::{AuthContext, AuthUser, TokenType, permissions_for_role};
use crate::{logging::fingerprint, services::UserAccountService};

#[derive(Clone)]
pub enum AuthContextResolver {
    /// Only the shared API key protects writes.
    Disabled,
    Enabled { accounts: UserAccountService },
}

impl AuthContextResolver {
    pub fn disabled() -> Self {
        Self::Disabled
    }

    pub fn enabled(accounts: UserAccountService) -> Self {
        Self::Enabled { accounts }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    pub async fn resolve(&self, headers: &HeaderMap) -> AuthContext {
        match self {
            Self::Disabled => AuthContext::anonymous(),
            Self::Enabled { accounts } => match bearer_token(headers) {
                Some(token) => resolve_token(accounts, token).await,
                None => AuthContext::anonymous(),
            },
        }
    }
}

async fn resolve_token(accounts: &UserAccountService, token: &str) -> AuthContext {
    let Some(payload) = accounts.tokens().verify(token, TokenType::Access) else {
        tracing::warn!(token = %fingerprint(token), "bearer token rejected");
        return AuthContext::anonymous();
    };

    match accounts.get_by_id(payload.user_id).await {
        Ok(Some(profile)) => {
            let role = profile.role;
            AuthContext::authenticated(
                AuthUser {
                    id: profile.id,
                    email: profile.email,
                    role,
                    display_name: profile.display_name,
                },
                permissions_for_role(role),
            )
        }
        Ok(None) => {
            log_missing_user(payload.user_id);
            AuthContext::anonymous()
        }
        Err(err) => {
            tracing::error!(user_id = %payload.user_id, error = %err, "user lookup failed during auth");
            AuthContext::anonymous()
        }
    }
}

fn log_missing_user(user_id: Uuid) {
    tracing::warn!(user_id = %user_id, "valid token for missing or disabled user");
}

/// Token from `Authorization: Bearer <token>`, if present and non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
