mod cors;
mod guards;
mod json_error;
mod panic;
mod rate_limit;
mod security_headers;

pub use cors::cors_layer;
pub use guards::{Auth, RequirePermission, RequireRole};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
pub use rate_limit::{RateLimit, RateLimitLayer, client_ip};
pub use security_headers::security_headers;
