// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access and refresh token issuing and verification.
//!
//! Both token types are HS256 JWTs with their own secret and lifetime, so
//! a leaked access-token secret cannot mint refresh tokens. The `typ`
//! claim is checked as well.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::models::User;

/// Token type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
    pub typ: TokenType,
    // Identity carried by access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Claims {
    /// Parse the subject claim as a user ID.
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }
}

/// Token verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenKeys {
    fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }
}

/// Issues and verifies both token types.
pub struct TokenService {
    access: TokenKeys,
    refresh: TokenKeys,
}

impl TokenService {
    pub fn new(
        access_secret: &[u8],
        access_ttl_secs: i64,
        refresh_secret: &[u8],
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access: TokenKeys::new(access_secret, access_ttl_secs),
            refresh: TokenKeys::new(refresh_secret, refresh_ttl_secs),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.access_token_secret,
            config.access_token_ttl_secs,
            &config.refresh_token_secret,
            config.refresh_token_ttl_secs,
        )
    }

    fn keys(&self, typ: TokenType) -> &TokenKeys {
        match typ {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    /// Lifetime of a token type, in seconds.
    pub fn ttl_secs(&self, typ: TokenType) -> i64 {
        self.keys(typ).ttl_secs
    }

    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(claims.typ).encoding,
        )?)
    }

    fn base_claims(&self, user_id: Uuid, typ: TokenType) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs(typ),
            jti: Uuid::new_v4().to_string(),
            typ,
            username: None,
            email: None,
            full_name: None,
        }
    }

    /// Issue a short-lived access token carrying the user's public identity.
    pub fn issue_access_token(&self, user: &User) -> anyhow::Result<String> {
        let claims = Claims {
            username: Some(user.username.clone()),
            email: Some(user.email.clone()),
            full_name: Some(user.full_name.clone()),
            ..self.base_claims(user.id, TokenType::Access)
        };
        self.sign(&claims)
    }

    /// Issue a long-lived refresh token carrying only the subject.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign(&self.base_claims(user_id, TokenType::Refresh))
    }

    /// Verify signature, expiry and type, returning the claims.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.keys(expected).decoding, &validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                JwtErrorKind::InvalidToken
                | JwtErrorKind::Base64(_)
                | JwtErrorKind::Json(_)
                | JwtErrorKind::Utf8(_)
                | JwtErrorKind::MissingRequiredClaim(_) => TokenError::Malformed,
                _ => TokenError::Invalid,
            },
        )?;

        if data.claims.typ != expected {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"access_secret", 900, b"refresh_secret", 86400)
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            full_name: "Alice".to_string(),
            password_hash: "hash".to_string(),
            avatar: "https://cdn.example.com/a.png".to_string(),
            cover_image: None,
            watch_history: vec![],
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let tokens = service();
        let user = user();

        let token = tokens.issue_access_token(&user).unwrap();
        let claims = tokens.verify(&token, TokenType::Access).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_has_no_profile_claims() {
        let tokens = service();
        let id = Uuid::new_v4();

        let token = tokens.issue_refresh_token(id).unwrap();
        let claims = tokens.verify(&token, TokenType::Refresh).unwrap();

        assert_eq!(claims.user_id().unwrap(), id);
        assert!(claims.username.is_none());
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_tokens_issued_back_to_back_differ() {
        let tokens = service();
        let id = Uuid::new_v4();
        assert_ne!(
            tokens.issue_refresh_token(id).unwrap(),
            tokens.issue_refresh_token(id).unwrap()
        );
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let tokens = service();
        let token = tokens.issue_access_token(&user()).unwrap();
        assert_eq!(
            tokens.verify(&token, TokenType::Refresh).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn test_refresh_secret_cannot_forge_with_access_secret() {
        // Sign a refresh-typed token with the access secret.
        let tokens = service();
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &tokens.base_claims(Uuid::new_v4(), TokenType::Refresh),
            &EncodingKey::from_secret(b"access_secret"),
        )
        .unwrap();

        assert_eq!(
            tokens.verify(&forged, TokenType::Refresh).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn test_expired_token() {
        let tokens = TokenService::new(b"access_secret", -10, b"refresh_secret", -10);
        let token = tokens.issue_refresh_token(Uuid::new_v4()).unwrap();
        assert_eq!(
            tokens.verify(&token, TokenType::Refresh).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_malformed_token() {
        assert_eq!(
            service()
                .verify("not-a-jwt", TokenType::Access)
                .unwrap_err(),
            TokenError::Malformed
        );
    }
}
