use std::sync::Arc;

use chrono::Utc;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::{AccessToken, PasswordHasher, Role, TokenPair, TokenService, TokenType},
    db::{
        dao::DaoLayerError,
        store::{NewUser, UserRecord, UserStore},
    },
    error::AppError,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub email_verified: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<&UserRecord> for UserProfile {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email.clone(),
            display_name: record.display_name.clone(),
            role: Role::from_stored(&record.role),
            email_verified: record.email_verified,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register, login, refresh and password management over a [`UserStore`].
#[derive(Clone)]
pub struct UserAccountService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl UserAccountService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Every self-registered account is an admin of its own league data.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthResult, AppError> {
        let email = normalize_email(email);
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = self.hasher.hash_async(password).await?;
        let record = self
            .store
            .insert(NewUser {
                email,
                display_name: display_name.to_string(),
                password_hash: Some(password_hash),
                role: Role::Admin,
            })
            .await
            .map_err(|err| match err {
                DaoLayerError::Duplicate { .. } => email_taken(),
                other => AppError::from(other),
            })?;

        let user = UserProfile::from(&record);
        let tokens = self.tokens.issue_pair(user.id, &user.email, user.role)?;
        tracing::info!(user_id = %user.id, "account registered");

        Ok(AuthResult { user, tokens })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AppError> {
        let email = normalize_email(email);
        let record = self.store.find_by_email(&email).await?;

        let Some((record, stored_hash)) =
            record.and_then(|r| r.password_hash.clone().map(|hash| (r, hash)))
        else {
            // Spend the same Argon2 work as a real verification before rejecting.
            let _ = self.hasher.hash_async(password).await;
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !self.hasher.verify_async(password, &stored_hash).await {
            tracing::debug!(user_id = %record.id, "login rejected: wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        if !record.is_active {
            tracing::info!(user_id = %record.id, "login rejected: account disabled");
            return Err(AppError::forbidden("Account is disabled"));
        }

        if self.hasher.needs_rehash(&stored_hash) {
            let upgraded = self.hasher.hash_async(password).await?;
            self.store.set_password_hash(record.id, upgraded).await?;
            tracing::info!(user_id = %record.id, "password hash upgraded");
        }

        self.store
            .set_last_login(record.id, Utc::now().fixed_offset())
            .await?;

        let user = UserProfile::from(&record);
        let tokens = self.tokens.issue_pair(user.id, &user.email, user.role)?;
        Ok(AuthResult { user, tokens })
    }

    /// Issues a new access token; the refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AppError> {
        let payload = self
            .tokens
            .verify(refresh_token, TokenType::Refresh)
            .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

        let record = self
            .store
            .find_by_id(payload.user_id)
            .await?
            .filter(|record| record.is_active)
            .ok_or_else(|| AppError::unauthorized("Account not found or disabled"))?;

        self.tokens.issue_access(
            record.id,
            &record.email,
            Role::from_stored(&record.role),
        )
    }

    /// `None` for missing and for deactivated accounts.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self
            .store
            .find_by_id(id)
            .await?
            .filter(|record| record.is_active)
            .map(|record| UserProfile::from(&record)))
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<UserProfile, AppError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let stored_hash = self
            .store
            .find_by_id(user_id)
            .await?
            .and_then(|record| record.password_hash)
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !self.hasher.verify_async(old_password, &stored_hash).await {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        let new_hash = self.hasher.hash_async(new_password).await?;
        self.store.set_password_hash(user_id, new_hash).await?;
        tracing::info!(user_id = %user_id, "password changed");
        Ok(())
    }
}

fn email_taken() -> AppError {
    AppError::conflict("An account with this email already exists")
}
