use std::backtrace::Backtrace;

use sha2::{Digest, Sha256};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. `RUST_LOG` from the process environment
/// wins over the configured default.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    if fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
    set_panic_hook();
}

/// Short, stable tag for a credential so log lines can be correlated
/// without ever writing the credential itself.
pub fn fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(&digest[..4])
}

/// One-line description of a fatal startup error, including its cause chain.
pub fn startup_failure(err: &anyhow::Error) -> String {
    format!("kartixa failed to start: {err:#}")
}

fn set_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = if let Some(message) = info.payload().downcast_ref::<&str>() {
            *message
        } else if let Some(message) = info.payload().downcast_ref::<String>() {
            message.as_str()
        } else {
            "unknown panic"
        };

        let backtrace = Backtrace::capture();

        match info.location() {
            Some(location) => tracing::error!(
                panic = %message,
                location = %location,
                backtrace = %backtrace,
                "panic"
            ),
            None => tracing::error!(panic = %message, backtrace = %backtrace, "panic"),
        }
    }));
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::{fingerprint, startup_failure};
    use crate::config::{AppConfig, validate::validate};

    #[test]
    fn fingerprint_is_short_and_stable() {
        let token = "eyJhbGciOiJIUzI1NiJ9.payload.signature";

        assert_eq!(fingerprint(token), fingerprint(token));
        assert_eq!(fingerprint(token).len(), 8);
        assert!(!fingerprint(token).contains("payload"));
        assert_ne!(fingerprint(token), fingerprint("other-token"));
    }

    #[test]
    fn startup_failure_carries_validation_text() {
        let cfg = AppConfig {
            auth_enabled: true,
            jwt_secret: Some("short".to_string()),
            ..AppConfig::default()
        };
        let err = validate(&cfg)
            .context("invalid configuration")
            .expect_err("short secret should be rejected");

        let report = startup_failure(&err);
        assert!(report.starts_with("kartixa failed to start: invalid configuration"));
        assert!(report.contains("AUTH_ENABLED=true requires JWT_SECRET with at least 32 characters"));
    }
}
