use std::{fmt, time::Duration};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

/// Process-wide settings, read once at startup and shared read-only.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub app_env: String,
    pub rust_log: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_idle: u32,
    pub auth_enabled: bool,
    pub jwt_secret: Option<String>,
    pub password_pepper: Option<String>,
    pub api_key: Option<String>,
    pub rate_limit_max: u32,
    pub rate_limit_window_ms: u64,
    /// Comma-separated browser origins; `*` allows any origin.
    pub cors_origins: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn database_url(&self) -> Option<&str> {
        match self.database_url.as_deref() {
            Some(url) => Some(url),
            None if cfg!(debug_assertions) => Some(defaults::DEFAULT_DEV_DATABASE_URL),
            None => None,
        }
    }

    pub fn cors_origin_list(&self) -> Vec<&str> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .collect()
    }

    /// The JWT secret, but only when it is long enough to sign with.
    pub fn usable_jwt_secret(&self) -> Option<&str> {
        self.jwt_secret
            .as_deref()
            .filter(|secret| secret.len() >= defaults::MIN_JWT_SECRET_LEN)
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT,
            app_env: defaults::DEFAULT_APP_ENV.to_string(),
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
            database_url: None,
            db_max_connections: defaults::DEFAULT_DB_MAX_CONNECTIONS,
            db_min_idle: defaults::DEFAULT_DB_MIN_IDLE,
            auth_enabled: false,
            jwt_secret: None,
            password_pepper: None,
            api_key: None,
            rate_limit_max: defaults::DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window_ms: defaults::DEFAULT_RATE_LIMIT_WINDOW_MS,
            cors_origins: defaults::DEFAULT_CORS_ORIGINS.to_string(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("app_env", &self.app_env)
            .field("rust_log", &self.rust_log)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_idle", &self.db_min_idle)
            .field("auth_enabled", &self.auth_enabled)
            .field("jwt_secret", &redacted(&self.jwt_secret))
            .field("password_pepper", &redacted(&self.password_pepper))
            .field("api_key", &redacted(&self.api_key))
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_window_ms", &self.rate_limit_window_ms)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

fn redacted(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "<redacted>" } else { "<unset>" }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = AppConfig {
            jwt_secret: Some("jwt-secret-that-must-never-be-logged".to_string()),
            password_pepper: Some("pepper-value".to_string()),
            api_key: Some("api-key-value".to_string()),
            ..AppConfig::default()
        };

        let rendered = format!("{cfg:?}");

        assert!(!rendered.contains("jwt-secret-that-must-never-be-logged"));
        assert!(!rendered.contains("pepper-value"));
        assert!(!rendered.contains("api-key-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn short_jwt_secret_is_not_usable() {
        let cfg = AppConfig {
            jwt_secret: Some("too-short".to_string()),
            ..AppConfig::default()
        };
        assert!(cfg.usable_jwt_secret().is_none());

        let cfg = AppConfig {
            jwt_secret: Some("x".repeat(32)),
            ..AppConfig::default()
        };
        assert_eq!(cfg.usable_jwt_secret().map(str::len), Some(32));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cfg = AppConfig {
            cors_origins: " https://a.example , ,https://b.example".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            cfg.cors_origin_list(),
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(AppConfig::default().cors_origin_list(), vec!["http://localhost:3000"]);
    }

    #[test]
    fn production_flag_is_case_insensitive() {
        let cfg = AppConfig {
            app_env: "Production".to_string(),
            ..AppConfig::default()
        };
        assert!(cfg.is_production());
        assert!(!AppConfig::default().is_production());
    }
}
