// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{Claims, JwtError, TokenKind, TokenPair};
use crate::config::ValidatedJwtConfig;
use crate::store::UserId;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

/// The only algorithm tokens are signed with or accepted under.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Create a new TokenService from configuration
    pub fn new(config: &ValidatedJwtConfig) -> Result<Self, JwtError> {
        if config.secret.is_empty() {
            return Err(JwtError::ConfigurationError(
                "Signing secret is empty".to_string(),
            ));
        }
        let access_ttl = Duration::from_std(config.access_ttl)
            .map_err(|e| JwtError::ConfigurationError(e.to_string()))?;
        let refresh_ttl = Duration::from_std(config.refresh_ttl)
            .map_err(|e| JwtError::ConfigurationError(e.to_string()))?;

        Ok(TokenService {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Issue an access/refresh pair for a user
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, JwtError> {
        let access_token = self.sign(&self.build_claims(user_id, TokenKind::Access))?;
        let refresh_token = self.sign(&self.build_claims(user_id, TokenKind::Refresh))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_in: self.access_ttl.num_seconds().max(0) as u64,
        })
    }

    fn build_claims(&self, user_id: UserId, kind: TokenKind) -> Claims {
        let now = Utc::now();
        let expiration = now + self.ttl(kind);

        Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            kind,
        }
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenCreationError(e.to_string()))
    }

    /// Verify signature, algorithm, issuer, audience and expiry
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| JwtError::TokenVerificationError(e.to_string()))?;

        if token_data.header.alg != SIGNING_ALGORITHM {
            return Err(JwtError::TokenVerificationError(format!(
                "unexpected signing algorithm {:?}",
                token_data.header.alg
            )));
        }

        let claims = token_data.claims;
        if claims.subject_id().is_none() {
            return Err(JwtError::TokenVerificationError(
                "subject is not a user id".to_string(),
            ));
        }
        Ok(claims)
    }

    fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<UserId, JwtError> {
        let claims = self.validate(token)?;
        if claims.kind != expected {
            return Err(JwtError::TokenVerificationError(format!(
                "expected {} token, got {}",
                expected, claims.kind
            )));
        }
        claims.subject_id().ok_or_else(|| {
            JwtError::TokenVerificationError("subject is not a user id".to_string())
        })
    }

    pub fn validate_access(&self, token: &str) -> Result<UserId, JwtError> {
        self.validate_kind(token, TokenKind::Access)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<UserId, JwtError> {
        self.validate_kind(token, TokenKind::Refresh)
    }

    /// Exchange a refresh token for a new pair. The presented token stays valid until it expires.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, JwtError> {
        let user_id = self.validate_refresh(refresh_token)?;
        self.issue_pair(user_id)
    }
}

#[cfg(test)]
pub(crate) fn test_jwt_config() -> ValidatedJwtConfig {
    ValidatedJwtConfig {
        secret: "test-secret-key-test-secret-key-0".to_string(),
        issuer: "test-issuer".to_string(),
        audience: "test-audience".to_string(),
        access_ttl: std::time::Duration::from_secs(24 * 3600),
        refresh_ttl: std::time::Duration::from_secs(7 * 24 * 3600),
    }
}
