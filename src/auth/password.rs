//! Peppered Argon2id password hashing.
//!
//! The password is first run through HMAC-SHA256 keyed with the server-held
//! pepper, and the hex digest is what Argon2id sees. Without a pepper the raw
//! password is hashed directly; that mode is only meant for development and
//! startup validation warns about it in production.

use std::{fmt, sync::Arc};

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use hmac::{Hmac, Mac};
use rand::thread_rng;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub output_len: usize,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
            output_len: 32,
        }
    }
}

impl HashParams {
    /// Smallest parameters Argon2 accepts. Only for tests.
    pub const fn low_cost() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
            output_len: 32,
        }
    }
}

#[derive(Clone)]
pub struct PasswordHasher {
    pepper: Option<Arc<str>>,
    params: HashParams,
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(pepper: Option<&str>, params: HashParams) -> Result<Self, AppError> {
        let argon_params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(params.output_len),
        )
        .map_err(|err| AppError::internal(format!("Invalid Argon2 parameters: {err}")))?;

        Ok(Self {
            pepper: pepper.filter(|p| !p.is_empty()).map(Arc::from),
            params,
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params),
        })
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    pub fn is_peppered(&self) -> bool {
        self.pepper.is_some()
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let peppered = self.apply_pepper(password)?;
        let salt = SaltString::generate(&mut thread_rng());
        self.argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| {
                tracing::error!(error = %err, "password hashing failed");
                AppError::internal("Password hashing failed")
            })
    }

    /// Malformed or foreign hashes verify as `false`.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        let Ok(peppered) = self.apply_pepper(password) else {
            return false;
        };
        self.argon2
            .verify_password(peppered.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn needs_rehash(&self, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return true;
        };
        if parsed.algorithm.as_str() != Algorithm::Argon2id.as_str() {
            return true;
        }
        if parsed.version != Some(u32::from(Version::V0x13)) {
            return true;
        }
        let Ok(stored) = Params::try_from(&parsed) else {
            return true;
        };

        stored.m_cost() != self.params.memory_kib
            || stored.t_cost() != self.params.iterations
            || stored.p_cost() != self.params.parallelism
            || parsed.hash.map(|output| output.len()) != Some(self.params.output_len)
    }

    pub async fn hash_async(&self, password: &str) -> Result<String, AppError> {
        let hasher = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "password hashing task failed");
                AppError::internal("Password hashing failed")
            })?
    }

    pub async fn verify_async(&self, password: &str, stored_hash: &str) -> bool {
        let hasher = self.clone();
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .unwrap_or(false)
    }

    fn apply_pepper(&self, password: &str) -> Result<String, AppError> {
        let Some(pepper) = self.pepper.as_deref() else {
            return Ok(password.to_owned());
        };
        let mut mac = <HmacSha256 as Mac>::new_from_slice(pepper.as_bytes())
            .map_err(|err| AppError::internal(format!("Pepper initialization failed: {err}")))?;
        mac.update(password.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("peppered", &self.is_peppered())
            .field("params", &self.params)
            .finish()
    }
}
