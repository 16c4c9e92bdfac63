use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::validation;
use crate::{
    auth::{AccessToken, AdminRole, AuthContext},
    error::AppError,
    middleware::RequireRole,
    response::{ApiResult, JsonApiResponse},
    services::{AuthResult, UserProfile},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordChanged {
    pub changed: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/auth/me/password", post(change_password))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<AuthResult> {
    let email = validation::email(&body.email)?;
    validation::new_password(&body.password, "Password")?;
    let display_name = validation::display_name(&body.display_name)?;

    let result = state
        .accounts()?
        .register(&email, &body.password, &display_name)
        .await?;
    JsonApiResponse::created(result)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<AuthResult> {
    let email = validation::email(&body.email)?;
    validation::present_password(&body.password, "Password is required")?;

    let result = state.accounts()?.login(&email, &body.password).await?;
    JsonApiResponse::ok(result)
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<AccessToken> {
    validation::refresh_token(&body.refresh_token)?;

    let token = state.accounts()?.refresh(&body.refresh_token).await?;
    JsonApiResponse::ok(token)
}

async fn me(
    State(state): State<Arc<AppState>>,
    guard: RequireRole<AdminRole>,
) -> ApiResult<UserProfile> {
    let user_id = signed_in_user(&guard.ctx)?;
    let profile = state.accounts()?.get_profile(user_id).await?;
    JsonApiResponse::ok(profile)
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    guard: RequireRole<AdminRole>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<PasswordChanged> {
    let user_id = signed_in_user(&guard.ctx)?;
    validation::present_password(&body.old_password, "Current password is required")?;
    validation::new_password(&body.new_password, "New password")?;

    state
        .accounts()?
        .change_password(user_id, &body.old_password, &body.new_password)
        .await?;
    JsonApiResponse::ok(PasswordChanged { changed: true })
}

// An API key passes the admin guard but has no account behind it.
fn signed_in_user(ctx: &AuthContext) -> Result<uuid::Uuid, AppError> {
    ctx.user()
        .map(|user| user.id)
        .ok_or_else(|| AppError::unauthorized("Authentication required"))
}
