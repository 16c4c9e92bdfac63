//! HS256 access/refresh tokens.
//!
//! Both token kinds carry the same identity claims and differ only in the
//! `type` claim and lifetime. Verification never errors: every failure is a
//! `None` so callers can answer uniformly.

use std::{fmt, sync::Arc};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Role,
    clock::{Clock, SystemClock},
};
use crate::{config::defaults::MIN_JWT_SECRET_LEN, error::AppError};

pub const TOKEN_ISSUER: &str = "kartixa";
pub const TOKEN_AUDIENCE: &str = "kartixa";
pub const ACCESS_TTL_SECS: u64 = 15 * 60;
pub const REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn ttl_secs(self) -> u64 {
        match self {
            TokenType::Access => ACCESS_TTL_SECS,
            TokenType::Refresh => REFRESH_TTL_SECS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iss: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

/// Decoded, fully validated token body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token_type: TokenType,
    pub issued_at: u64,
    pub expires_at: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &str, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::internal(format!(
                "JWT secret must be at least {MIN_JWT_SECRET_LEN} characters"
            )));
        }

        Ok(Self {
            keys: JwtKeys::from_secret(secret.as_bytes()),
            clock,
        })
    }

    pub fn issue_pair(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
    ) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, email, role, TokenType::Access)?,
            refresh_token: self.sign(user_id, email, role, TokenType::Refresh)?,
            expires_in: ACCESS_TTL_SECS,
        })
    }

    pub fn issue_access(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
    ) -> Result<AccessToken, AppError> {
        Ok(AccessToken {
            access_token: self.sign(user_id, email, role, TokenType::Access)?,
            expires_in: ACCESS_TTL_SECS,
        })
    }

    pub fn verify(&self, token: &str, expected: TokenType) -> Option<TokenPayload> {
        let data = decode::<Claims>(token, &self.keys.dec, &validation()).ok()?;
        let claims = data.claims;

        if claims.token_type != expected {
            return None;
        }
        if self.clock.now_unix() >= claims.exp {
            return None;
        }

        Some(TokenPayload {
            user_id: claims.sub.parse().ok()?,
            email: claims.email,
            role: Role::from_stored(&claims.role),
            token_type: claims.token_type,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    fn sign(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
        token_type: TokenType,
    ) -> Result<String, AppError> {
        let iat = self.clock.now_unix();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            token_type,
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat,
            exp: iat + token_type.ttl_secs(),
            jti: Uuid::new_v4().to_string(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        encode(&header, &claims, &self.keys.enc).map_err(|err| {
            tracing::error!(error = %err, "token signing failed");
            AppError::internal("Token signing failed")
        })
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

// Expiry is checked against the injected clock, not by jsonwebtoken.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_audience(&[TOKEN_AUDIENCE]);
    validation.set_required_spec_claims(&["exp", "iat", "iss", "aud", "sub"]);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jsonwebtoken::{Algorithm, Header, encode};
    use uuid::Uuid;

    use super::*;
    use crate::auth::clock::ManualClock;

    const SECRET: &str = "unit-test-secret-with-32-characters!";
    const NOW: u64 = 1_767_225_600; // 2026-01-01T00:00:00Z

    fn service_at(now: u64) -> (TokenService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let service =
            TokenService::with_clock(SECRET, clock.clone()).expect("secret should be accepted");
        (service, clock)
    }

    fn raw_claims(overrides: impl FnOnce(&mut Claims)) -> Claims {
        let mut claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "alice@example.com".to_string(),
            role: "admin".to_string(),
            token_type: TokenType::Access,
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat: NOW,
            exp: NOW + ACCESS_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
        };
        overrides(&mut claims);
        claims
    }

    fn sign_raw(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &JwtKeys::from_secret(secret.as_bytes()).enc,
        )
        .expect("token should encode")
    }

    #[test]
    fn rejects_short_secret() {
        let err = TokenService::new("too-short").expect_err("short secret should fail");
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn issued_pair_verifies_with_matching_types() {
        let (service, _) = service_at(NOW);
        let user_id = Uuid::new_v4();
        let pair = service
            .issue_pair(user_id, "alice@example.com", Role::Admin)
            .expect("pair should issue");

        assert_eq!(pair.expires_in, 900);

        let access = service
            .verify(&pair.access_token, TokenType::Access)
            .expect("access token should verify");
        assert_eq!(access.user_id, user_id);
        assert_eq!(access.email, "alice@example.com");
        assert_eq!(access.role, Role::Admin);
        assert_eq!(access.expires_at - access.issued_at, ACCESS_TTL_SECS);

        let refresh = service
            .verify(&pair.refresh_token, TokenType::Refresh)
            .expect("refresh token should verify");
        assert_eq!(refresh.user_id, user_id);
        assert_eq!(refresh.expires_at - refresh.issued_at, REFRESH_TTL_SECS);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let (service, _) = service_at(NOW);
        let pair = service
            .issue_pair(Uuid::new_v4(), "alice@example.com", Role::Admin)
            .expect("pair should issue");

        assert!(service.verify(&pair.refresh_token, TokenType::Access).is_none());
        assert!(service.verify(&pair.access_token, TokenType::Refresh).is_none());
    }

    #[test]
    fn expiry_boundary() {
        let (service, clock) = service_at(NOW);
        let token = service
            .issue_access(Uuid::new_v4(), "alice@example.com", Role::Public)
            .expect("access should issue")
            .access_token;
        let exp = NOW + ACCESS_TTL_SECS;

        clock.set(exp - 1);
        assert!(service.verify(&token, TokenType::Access).is_some());

        clock.set(exp);
        assert!(service.verify(&token, TokenType::Access).is_none());

        clock.set(exp + 1);
        assert!(service.verify(&token, TokenType::Access).is_none());
    }

    #[test]
    fn refresh_token_lives_seven_days() {
        let (service, clock) = service_at(NOW);
        let pair = service
            .issue_pair(Uuid::new_v4(), "alice@example.com", Role::Admin)
            .expect("pair should issue");

        clock.advance(REFRESH_TTL_SECS - 1);
        assert!(service.verify(&pair.refresh_token, TokenType::Refresh).is_some());
        assert!(service.verify(&pair.access_token, TokenType::Access).is_none());

        clock.advance(1);
        assert!(service.verify(&pair.refresh_token, TokenType::Refresh).is_none());
    }

    #[test]
    fn rejects_token_signed_with_different_secret() {
        let (service, _) = service_at(NOW);
        let token = sign_raw("another-secret-that-is-32-chars-long", &raw_claims(|_| {}));

        assert!(service.verify(&token, TokenType::Access).is_none());
    }

    #[test]
    fn rejects_wrong_issuer_or_audience() {
        let (service, _) = service_at(NOW);
        let wrong_issuer = sign_raw(SECRET, &raw_claims(|c| c.iss = "someone-else".to_string()));
        let wrong_audience = sign_raw(SECRET, &raw_claims(|c| c.aud = "someone-else".to_string()));
        let valid = sign_raw(SECRET, &raw_claims(|_| {}));

        assert!(service.verify(&wrong_issuer, TokenType::Access).is_none());
        assert!(service.verify(&wrong_audience, TokenType::Access).is_none());
        assert!(service.verify(&valid, TokenType::Access).is_some());
    }

    #[test]
    fn rejects_non_uuid_subject() {
        let (service, _) = service_at(NOW);
        let token = sign_raw(SECRET, &raw_claims(|c| c.sub = "admin".to_string()));

        assert!(service.verify(&token, TokenType::Access).is_none());
    }

    #[test]
    fn rejects_garbage() {
        let (service, _) = service_at(NOW);

        assert!(service.verify("not-a-jwt", TokenType::Access).is_none());
        assert!(service.verify("", TokenType::Access).is_none());
        assert!(service.verify("a.b.c", TokenType::Refresh).is_none());
    }

    #[test]
    fn successive_access_tokens_differ() {
        let (service, _) = service_at(NOW);
        let user_id = Uuid::new_v4();
        let first = service
            .issue_access(user_id, "alice@example.com", Role::Admin)
            .expect("access should issue");
        let second = service
            .issue_access(user_id, "alice@example.com", Role::Admin)
            .expect("access should issue");

        assert_ne!(first.access_token, second.access_token);
        assert_eq!(second.expires_in, 900);
    }

    #[test]
    fn token_pair_serializes_camel_case() {
        let pair = TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_in: ACCESS_TTL_SECS,
        };
        let json = serde_json::to_value(&pair).expect("pair should serialize");

        assert_eq!(
            json,
            serde_json::json!({"accessToken": "a", "refreshToken": "r", "expiresIn": 900})
        );
    }
}
