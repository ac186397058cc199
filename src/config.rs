// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Token secrets and password hashing parameters are read once at startup
//! and handed to the services that need them.

use std::env;

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Origin allowed by CORS (credentials enabled)
    pub cors_origin: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Document store selection
    pub store_backend: StoreBackend,

    // --- Secrets ---
    /// Signing key for access tokens (raw bytes)
    pub access_token_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Signing key for refresh tokens (raw bytes)
    pub refresh_token_secret: Vec<u8>,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,

    // --- Password hashing ---
    /// Argon2 memory cost in KiB
    pub password_memory_kib: u32,
    /// Argon2 iteration count
    pub password_iterations: u32,
}

const DEFAULT_ACCESS_TTL_SECS: i64 = 24 * 60 * 60; // 1 day
const DEFAULT_REFRESH_TTL_SECS: i64 = 10 * 24 * 60 * 60; // 10 days

impl Config {
    /// Config for tests only: in-memory store and cheap password hashing.
    pub fn test_default() -> Self {
        Self {
            cors_origin: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8000,
            store_backend: StoreBackend::Memory,
            access_token_secret: b"test_access_key_32_bytes_minimum!".to_vec(),
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_secret: b"test_refresh_key_32_bytes_minimum".to_vec(),
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            password_memory_kib: 1024,
            password_iterations: 1,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("DOCUMENT_STORE")
            .unwrap_or_else(|_| "firestore".to_string())
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            _ => return Err(ConfigError::Invalid("DOCUMENT_STORE must be firestore or memory")),
        };

        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?
            .into_bytes();
        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?
            .into_bytes();

        if access_token_secret.is_empty() || refresh_token_secret.is_empty() {
            return Err(ConfigError::Invalid("token secrets must not be empty"));
        }
        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::Invalid(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ",
            ));
        }

        let defaults = argon2::Params::default();

        Ok(Self {
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 8000),
            store_backend,
            access_token_secret,
            access_token_ttl_secs: parse_or("ACCESS_TOKEN_EXPIRY_SECS", DEFAULT_ACCESS_TTL_SECS),
            refresh_token_secret,
            refresh_token_ttl_secs: parse_or("REFRESH_TOKEN_EXPIRY_SECS", DEFAULT_REFRESH_TTL_SECS),
            password_memory_kib: parse_or("PASSWORD_HASH_MEMORY_KIB", defaults.m_cost()),
            password_iterations: parse_or("PASSWORD_HASH_ITERATIONS", defaults.t_cost()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
