// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and verification.
//!
//! Argon2id with a fresh random salt per hash, stored as a PHC string.
//! Both operations are CPU-heavy and run on the blocking pool.

use argon2::password_hash::SaltString;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
};
use rand::rngs::OsRng;

use crate::config::Config;
use crate::error::AppError;

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

/// One-way password hasher configured at startup.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher with the given Argon2 memory cost (KiB) and iteration count.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    pub fn from_config(config: &Config) -> Result<Self, PasswordError> {
        Self::new(config.password_memory_kib, config.password_iterations)
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    /// Hash a plaintext password into a PHC string.
    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let params = self.params.clone();
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Self::argon2(params)
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| PasswordError::HashingFailed(e.to_string()))
        })
        .await
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// Returns `false` on mismatch and on a digest that does not parse.
    /// The parameters embedded in the digest are used, so digests made
    /// under older settings still verify.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let params = self.params.clone();
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&digest) else {
                return false;
            };
            Self::argon2(params)
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
        .await;

        match result {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}
