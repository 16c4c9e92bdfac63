use anyhow::{Result, bail};

use super::{AppConfig, defaults};

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.host.trim().is_empty() {
        errors.push("HOST must not be empty".to_string());
    }

    if cfg.port == 0 {
        errors.push("PORT must be > 0".to_string());
    }

    if cfg.db_min_idle > cfg.db_max_connections {
        errors.push(format!(
            "DB_MIN_IDLE ({}) must be <= DB_MAX_CONNECTIONS ({})",
            cfg.db_min_idle, cfg.db_max_connections
        ));
    }

    if cfg.rate_limit_max == 0 {
        errors.push("RATE_LIMIT_MAX must be > 0".to_string());
    }

    if cfg.rate_limit_window_ms == 0 {
        errors.push("RATE_LIMIT_WINDOW_MS must be > 0".to_string());
    }

    if cfg.auth_enabled && cfg.usable_jwt_secret().is_none() {
        errors.push(format!(
            "AUTH_ENABLED=true requires JWT_SECRET with at least {} characters",
            defaults::MIN_JWT_SECRET_LEN
        ));
    }

    if !errors.is_empty() {
        bail!("invalid app config:\n- {}", errors.join("\n- "));
    }

    Ok(())
}

/// Settings that are legal but unsafe for a production deployment.
pub fn security_warnings(cfg: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if !cfg.is_production() {
        return warnings;
    }

    if cfg
        .api_key
        .as_deref()
        .is_some_and(|key| key.len() < defaults::MIN_API_KEY_LEN)
    {
        warnings.push("API_KEY is shorter than 32 characters");
    }

    if cfg.api_key.is_none() && !cfg.auth_enabled {
        warnings.push("neither API_KEY nor AUTH_ENABLED is set, write endpoints are unprotected");
    }

    if cfg.auth_enabled && cfg.password_pepper.is_none() {
        warnings.push("PASSWORD_PEPPER is not set, passwords are hashed without pepper");
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::{security_warnings, validate};
    use crate::config::AppConfig;

    fn production() -> AppConfig {
        AppConfig {
            app_env: "production".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        validate(&AppConfig::default()).expect("defaults should validate");
    }

    #[test]
    fn auth_enabled_requires_long_jwt_secret() {
        let cfg = AppConfig {
            auth_enabled: true,
            jwt_secret: Some("short".to_string()),
            ..AppConfig::default()
        };

        let err = validate(&cfg).expect_err("short secret should be rejected");
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn auth_enabled_without_secret_is_rejected() {
        let cfg = AppConfig {
            auth_enabled: true,
            ..AppConfig::default()
        };

        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn collects_every_error() {
        let cfg = AppConfig {
            host: " ".to_string(),
            db_min_idle: 20,
            db_max_connections: 5,
            rate_limit_max: 0,
            ..AppConfig::default()
        };

        let message = validate(&cfg).expect_err("config should be rejected").to_string();
        assert!(message.contains("HOST"));
        assert!(message.contains("DB_MIN_IDLE"));
        assert!(message.contains("RATE_LIMIT_MAX"));
    }

    #[test]
    fn warns_about_unprotected_production_writes() {
        let warnings = security_warnings(&production());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("unprotected"));
    }

    #[test]
    fn warns_about_missing_pepper_in_production() {
        let cfg = AppConfig {
            auth_enabled: true,
            jwt_secret: Some("x".repeat(48)),
            ..production()
        };

        let warnings = security_warnings(&cfg);
        assert!(warnings.iter().any(|w| w.contains("PASSWORD_PEPPER")));
    }

    #[test]
    fn warns_about_short_api_key_in_production() {
        let cfg = AppConfig {
            api_key: Some("short-key".to_string()),
            ..production()
        };

        let warnings = security_warnings(&cfg);
        assert_eq!(warnings, vec!["API_KEY is shorter than 32 characters"]);
    }

    #[test]
    fn development_has_no_warnings() {
        assert!(security_warnings(&AppConfig::default()).is_empty());
    }
}
