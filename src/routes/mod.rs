use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{
        RateLimitLayer, catch_panic_layer, cors_layer, json_error_middleware, security_headers,
    },
    state::AppState,
};

pub mod auth;
pub mod public;
pub mod validation;

pub const API_PREFIX: &str = "/api/v1";
pub const BODY_LIMIT_BYTES: usize = 100 * 1024;

/// API routes under [`API_PREFIX`]. Account routes only exist when a usable
/// JWT secret was configured.
pub fn router(state: Arc<AppState>) -> Router {
    let mut api = Router::new().merge(public::router(Arc::clone(&state)));
    if state.auth.accounts.is_some() {
        api = api.merge(auth::router(Arc::clone(&state)));
    }
    Router::new().nest(API_PREFIX, api)
}

/// The full service: routes plus the middleware stack, outermost last.
pub fn app(state: Arc<AppState>) -> Router {
    router(Arc::clone(&state))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(RateLimitLayer::new(Arc::clone(&state.rate_limiter)))
        .layer(cors_layer(&state.config))
        .layer(from_fn_with_state(state, security_headers))
        .layer(TraceLayer::new_for_http())
}
