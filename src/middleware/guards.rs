use std::{marker::PhantomData, sync::Arc};

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    auth::{API_KEY_HEADER, AuthContext, RequiredPermission, RequiredRole},
    error::AppError,
    state::AppState,
};

/// The caller's resolved [`AuthContext`], computed once per request.
#[derive(Debug, Clone)]
pub struct Auth(pub AuthContext);

impl FromRequestParts<Arc<AppState>> for Auth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>().cloned() {
            return Ok(Self(ctx));
        }

        let ctx = state.auth.resolver.resolve(&parts.headers).await;
        parts.extensions.insert(ctx.clone());
        Ok(Self(ctx))
    }
}

fn presented_api_key(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
}

pub struct RequireRole<R: RequiredRole> {
    pub ctx: AuthContext,
    _marker: PhantomData<R>,
}

impl<R> FromRequestParts<Arc<AppState>> for RequireRole<R>
where
    R: RequiredRole,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Auth(ctx) = Auth::from_request_parts(parts, state).await?;
        state
            .auth
            .guard
            .require_role(&ctx, R::required(), presented_api_key(parts))?;

        Ok(Self {
            ctx,
            _marker: PhantomData,
        })
    }
}

pub struct RequirePermission<P: RequiredPermission> {
    pub ctx: AuthContext,
    _marker: PhantomData<P>,
}

impl<P> FromRequestParts<Arc<AppState>> for RequirePermission<P>
where
    P: RequiredPermission,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Auth(ctx) = Auth::from_request_parts(parts, state).await?;
        state
            .auth
            .guard
            .require_permission(&ctx, P::required(), presented_api_key(parts))?;

        Ok(Self {
            ctx,
            _marker: PhantomData,
        })
    }
}
