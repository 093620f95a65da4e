// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};

use crate::store::UserId;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration
    pub iss: String, // Issuer
    pub aud: String, // Audience
    pub jti: String, // JWT ID
    pub kind: TokenKind,
}

impl Claims {
    pub fn subject_id(&self) -> Option<UserId> {
        self.sub.parse().ok().filter(|id: &UserId| *id > 0)
    }
}

/// Access and refresh token issued together.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_in: u64,
}

#[derive(Debug, Clone)]
pub enum JwtError {
    TokenCreationError(String),
    TokenVerificationError(String),
    ConfigurationError(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenCreationError(msg) => write!(f, "Token creation error: {}", msg),
            JwtError::TokenVerificationError(msg) => write!(f, "Token verification error: {}", msg),
            JwtError::ConfigurationError(msg) => write!(f, "JWT configuration error: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claims_require_kind() {
        let result: Result<Claims, _> = serde_json::from_value(json!({
            "sub": "1",
            "iat": 1700000000,
            "exp": 1700003600,
            "iss": "nop-blog",
            "aud": "nop-blog-clients",
            "jti": "jwt-id"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn subject_id_rejects_non_numeric_and_non_positive() {
        let mut claims = Claims {
            sub: "42".to_string(),
            iat: 0,
            exp: 0,
            iss: String::new(),
            aud: String::new(),
            jti: String::new(),
            kind: TokenKind::Access,
        };
        assert_eq!(claims.subject_id(), Some(42));
        claims.sub = "abc".to_string();
        assert_eq!(claims.subject_id(), None);
        claims.sub = "0".to_string();
        assert_eq!(claims.subject_id(), None);
    }
}
