// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod password;
pub mod session;
pub mod social;
pub mod tokens;

pub use password::{PasswordError, PasswordHasher};
pub use session::{LoginOutcome, Registration, SessionService, TokenPair};
pub use social::SocialService;
pub use tokens::{Claims, TokenError, TokenService, TokenType};
