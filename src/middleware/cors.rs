use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::API_KEY_HEADER, config::AppConfig};

const MAX_AGE: Duration = Duration::from_secs(86_400);

/// Browser access for the configured origins. A `*` entry echoes back any
/// requesting origin.
pub fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let origins = cfg.cors_origin_list();

    let allow_origin = if origins.contains(&"*") {
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .into_iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
            header::AUTHORIZATION,
        ])
        .max_age(MAX_AGE)
}
