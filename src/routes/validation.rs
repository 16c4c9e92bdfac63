//! Request body checks for the account routes.

use crate::error::AppError;

pub const MAX_EMAIL_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_DISPLAY_NAME_LEN: usize = 255;

/// Trims and lowercases, then checks shape and length.
pub fn email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !looks_like_email(&email) {
        return Err(AppError::bad_request("Invalid email address"));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(AppError::bad_request(format!(
            "Email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }
    Ok(email)
}

pub fn new_password(raw: &str, label: &str) -> Result<(), AppError> {
    let len = raw.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "{label} must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "{label} must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn present_password(raw: &str, missing: &str) -> Result<(), AppError> {
    if raw.is_empty() {
        return Err(AppError::bad_request(missing));
    }
    if raw.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn display_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Display name is required"));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(AppError::bad_request(format!(
            "Display name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn refresh_token(raw: &str) -> Result<(), AppError> {
    if raw.is_empty() {
        return Err(AppError::bad_request("Refresh token is required"));
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        assert_eq!(
            email("  Alice@Example.COM ").expect("valid email"),
            "alice@example.com"
        );
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in ["", "alice", "alice@", "@example.com", "a@b", "a b@example.com", "a@@b.com", "a@b..com"] {
            assert!(email(bad).is_err(), "{bad:?} should be rejected");
        }
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(email(&long).is_err());
    }

    #[test]
    fn password_bounds() {
        assert!(new_password("1234567", "Password").is_err());
        assert!(new_password("12345678", "Password").is_ok());
        assert!(new_password(&"x".repeat(128), "Password").is_ok());
        let err = new_password(&"x".repeat(129), "New password").expect_err("too long");
        assert_eq!(err.message(), "New password must be at most 128 characters");
    }

    #[test]
    fn present_password_only_needs_one_char() {
        assert!(present_password("", "Password is required").is_err());
        assert!(present_password("x", "Password is required").is_ok());
        assert!(present_password(&"x".repeat(129), "Password is required").is_err());
    }

    #[test]
    fn display_name_is_trimmed() {
        assert_eq!(display_name("  Alice ").expect("valid"), "Alice");
        assert!(display_name("   ").is_err());
        assert!(display_name(&"x".repeat(256)).is_err());
    }
}
