use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use serde::Serialize;

use crate::{
    auth::{PermissionSet, Role},
    middleware::Auth,
    response::{ApiResult, JsonApiResponse},
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub auth_enabled: bool,
    pub accounts_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub database: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub checks: ReadinessChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Whoami {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub permissions: PermissionSet,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/auth/permissions", get(permissions))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> ApiResult<Health> {
    JsonApiResponse::ok(Health {
        status: "ok",
        auth_enabled: state.auth.resolver.is_enabled(),
        accounts_enabled: state.auth.accounts.is_some(),
    })
}

/// 503 until the database answers a ping.
async fn ready(State(state): State<Arc<AppState>>) -> ApiResult<Readiness> {
    if let Err(err) = state.db.ping().await {
        tracing::warn!(error = %err, "readiness check failed");
        return JsonApiResponse::with_status(
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready",
            Readiness {
                status: "not_ready",
                checks: ReadinessChecks { database: "failed" },
                timestamp: None,
            },
        );
    }

    JsonApiResponse::ok(Readiness {
        status: "ready",
        checks: ReadinessChecks { database: "ok" },
        timestamp: Some(Utc::now().to_rfc3339()),
    })
}

/// What the current caller may do; anonymous callers get an empty set.
async fn permissions(Auth(ctx): Auth) -> ApiResult<Whoami> {
    JsonApiResponse::ok(Whoami {
        authenticated: ctx.is_authenticated(),
        role: ctx.user().map(|user| user.role),
        permissions: ctx.permissions(),
    })
}
