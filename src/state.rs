use std::sync::Arc;

use crate::{
    auth::AuthServices,
    config::AppConfig,
    db::DbHealth,
    error::AppError,
    rate_limit::RateLimiter,
    services::UserAccountService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: AuthServices,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub db: Arc<dyn DbHealth>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        auth: AuthServices,
        rate_limiter: Arc<dyn RateLimiter>,
        db: Arc<dyn DbHealth>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            auth,
            rate_limiter,
            db,
        })
    }

    pub fn accounts(&self) -> Result<&UserAccountService, AppError> {
        self.auth
            .accounts
            .as_ref()
            .ok_or_else(|| AppError::not_found("Account routes are not enabled"))
    }
}
