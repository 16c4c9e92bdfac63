use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    response::Response,
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::{rate_limit::RateLimiter, response::too_many_requests};

/// Rejects over-limit clients with 429 before any handler or extractor runs.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitLayer {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

#[derive(Clone)]
pub struct RateLimit<S> {
    inner: S,
    limiter: Arc<dyn RateLimiter>,
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit {
            inner,
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<S> Service<Request<Body>> for RateLimit<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let client = client_ip(req.headers());
        let decision = self.limiter.check(&client);

        if !decision.allowed {
            tracing::warn!(client = %client, path = %req.uri().path(), "rate limit exceeded");
            let retry_after = decision.retry_after_secs();
            return Box::pin(async move { Ok(too_many_requests(retry_after)) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then `"unknown"`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        Router,
        body::Body,
        http::{HeaderMap, HeaderValue, Request, StatusCode, header},
        routing::get,
    };
    use tower::ServiceExt;

    use super::{RateLimitLayer, client_ip};
    use crate::rate_limit::FixedWindowRateLimiter;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        assert_eq!(
            client_ip(&headers(&[
                ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
                ("x-real-ip", "10.0.0.2"),
            ])),
            "203.0.113.7"
        );
        assert_eq!(client_ip(&headers(&[("x-real-ip", "10.0.0.2")])), "10.0.0.2");
        assert_eq!(client_ip(&headers(&[("x-forwarded-for", " ")])), "unknown");
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[tokio::test]
    async fn over_limit_requests_get_429() {
        let limiter = Arc::new(FixedWindowRateLimiter::new(2, Duration::from_secs(60)));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(RateLimitLayer::new(limiter));

        let request = |ip: &'static str| {
            Request::builder()
                .uri("/")
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .expect("request should build")
        };

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request("198.51.100.1"))
                .await
                .expect("request should succeed");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let limited = app
            .clone()
            .oneshot(request("198.51.100.1"))
            .await
            .expect("request should succeed");
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = limited
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .expect("retry-after should be numeric");
        assert!((1..=60).contains(&retry_after));

        let other = app
            .oneshot(request("198.51.100.2"))
            .await
            .expect("request should succeed");
        assert_eq!(other.status(), StatusCode::OK);
    }
}
