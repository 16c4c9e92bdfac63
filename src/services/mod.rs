pub mod account_service;

pub use account_service::{AuthResult, UserAccountService, UserProfile, normalize_email};
