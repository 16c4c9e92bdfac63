use std::sync::Arc;

use super::{
    AuthContextResolver, AuthGuard, HashParams, PasswordHasher, TokenService,
    clock::{Clock, SystemClock},
};
use crate::{
    config::AppConfig, db::store::UserStore, error::AppError, services::UserAccountService,
};

/// Everything the HTTP layer needs to authenticate and authorize requests.
#[derive(Clone)]
pub struct AuthServices {
    /// `None` when no usable JWT secret is configured.
    pub accounts: Option<UserAccountService>,
    pub resolver: AuthContextResolver,
    pub guard: AuthGuard,
}

pub fn build_auth_services(
    cfg: &AppConfig,
    store: Arc<dyn UserStore>,
) -> Result<AuthServices, AppError> {
    build_auth_services_with(cfg, store, HashParams::default(), Arc::new(SystemClock))
}

pub fn build_auth_services_with(
    cfg: &AppConfig,
    store: Arc<dyn UserStore>,
    params: HashParams,
    clock: Arc<dyn Clock>,
) -> Result<AuthServices, AppError> {
    let guard = AuthGuard::new(cfg.api_key.as_deref());
    let hasher = PasswordHasher::new(cfg.password_pepper.as_deref(), params)?;
    let peppered = hasher.is_peppered();

    let accounts = match cfg.usable_jwt_secret() {
        Some(secret) => {
            tracing::info!("account routes enabled");
            let tokens = TokenService::with_clock(secret, clock)?;
            Some(UserAccountService::new(store, hasher, tokens))
        }
        None => {
            tracing::warn!("no usable JWT_SECRET, account routes disabled");
            None
        }
    };

    let resolver = match (cfg.auth_enabled, &accounts) {
        (false, _) => AuthContextResolver::disabled(),
        (true, Some(accounts)) => AuthContextResolver::enabled(accounts.clone()),
        (true, None) => {
            return Err(AppError::internal(
                "AUTH_ENABLED requires a JWT_SECRET of at least 32 characters",
            ));
        }
    };

    tracing::info!(
        auth_enabled = cfg.auth_enabled,
        api_key = guard.api_key().is_configured(),
        peppered,
        "auth services ready"
    );

    Ok(AuthServices {
        accounts,
        resolver,
        guard,
    })
}
