// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::jwt::{JwtError, TokenPair, TokenService};
use super::password::{PasswordError, PasswordHashing};
use crate::config::ValidatedJwtConfig;
use crate::security::{validate_email_field, validate_new_password, validate_username};
use crate::store::{Credential, CredentialStore, NewCredential, StoreError, UserId};
use std::fmt;
use std::sync::Arc;

/// Single entry point for registration, login and token renewal.
pub struct UserServices {
    credentials: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHashing>,
    token_service: TokenService,
    dummy_stored_hash: String,
}

pub type UserServiceResult<T> = Result<T, UserServiceError>;

#[derive(Debug)]
pub enum UserServiceError {
    Validation(String),
    /// Login failed. Carries no detail on purpose.
    InvalidCredentials,
    /// A presented token was rejected or its subject is gone.
    Unauthenticated,
    Store(StoreError),
    Jwt(JwtError),
    Password(PasswordError),
}

impl fmt::Display for UserServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserServiceError::Validation(message) => write!(f, "{}", message),
            UserServiceError::InvalidCredentials => write!(f, "Invalid email or password"),
            UserServiceError::Unauthenticated => write!(f, "Authentication required"),
            UserServiceError::Store(err) => write!(f, "{}", err),
            UserServiceError::Jwt(err) => write!(f, "{}", err),
            UserServiceError::Password(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for UserServiceError {}

impl From<PasswordError> for UserServiceError {
    fn from(err: PasswordError) -> Self {
        UserServiceError::Password(err)
    }
}

impl From<StoreError> for UserServiceError {
    fn from(err: StoreError) -> Self {
        UserServiceError::Store(err)
    }
}

pub const DUPLICATE_REGISTRATION_MESSAGE: &str = "Unable to register with the provided details";

fn build_dummy_stored_hash(hasher: &dyn PasswordHashing) -> Result<String, PasswordError> {
    hasher.hash("dummy-password")
}

impl UserServices {
    pub fn new(
        jwt: &ValidatedJwtConfig,
        credentials: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHashing>,
    ) -> UserServiceResult<Self> {
        let token_service = TokenService::new(jwt).map_err(UserServiceError::Jwt)?;
        let dummy_stored_hash = build_dummy_stored_hash(hasher.as_ref())?;
        Ok(UserServices {
            credentials,
            hasher,
            token_service,
            dummy_stored_hash,
        })
    }

    pub fn token_service(&self) -> &TokenService {
        &self.token_service
    }

    pub fn find_user(&self, id: UserId) -> UserServiceResult<Option<Credential>> {
        Ok(self.credentials.user_by_id(id)?)
    }

    /// Create an account. Duplicate e-mails get a generic validation message.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> UserServiceResult<Credential> {
        let username = validate_username(username).map_err(UserServiceError::Validation)?;
        validate_email_field(email).map_err(UserServiceError::Validation)?;
        validate_new_password(password).map_err(UserServiceError::Validation)?;

        let password_digest = self.hasher.hash(password)?;
        match self.credentials.create_user(NewCredential {
            username,
            email: email.to_string(),
            password_digest,
        }) {
            Ok(user) => {
                log::info!("Registered user {}", user.id);
                Ok(user)
            }
            Err(StoreError::Conflict(_)) => {
                log::debug!("Registration rejected: e-mail already in use");
                Err(UserServiceError::Validation(
                    DUPLICATE_REGISTRATION_MESSAGE.to_string(),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Check credentials and issue a token pair.
    ///
    /// Unknown addresses are verified against a dummy digest so both
    /// failure paths cost one argon2 verification.
    pub fn login(&self, email: &str, password: &str) -> UserServiceResult<(Credential, TokenPair)> {
        let user = self.credentials.user_by_email(email)?;
        let stored_hash = match user.as_ref() {
            Some(user) => user.password_digest.as_str(),
            None => self.dummy_stored_hash.as_str(),
        };

        let valid = self.hasher.verify(password, stored_hash)?;
        let user = match user {
            Some(user) if valid => user,
            _ => {
                log::debug!("Login rejected");
                return Err(UserServiceError::InvalidCredentials);
            }
        };

        let pair = self
            .token_service
            .issue_pair(user.id)
            .map_err(UserServiceError::Jwt)?;
        log::debug!("Issued token pair for user {}", user.id);
        Ok((user, pair))
    }

    /// Exchange a refresh token for a new pair while its subject still exists.
    pub fn refresh(&self, refresh_token: &str) -> UserServiceResult<TokenPair> {
        let user_id = self
            .token_service
            .validate_refresh(refresh_token)
            .map_err(|err| {
                log::debug!("Refresh rejected: {}", err);
                UserServiceError::Unauthenticated
            })?;

        if self.credentials.user_by_id(user_id)?.is_none() {
            log::debug!("Refresh rejected: user {} no longer exists", user_id);
            return Err(UserServiceError::Unauthenticated);
        }

        self.token_service
            .issue_pair(user_id)
            .map_err(UserServiceError::Jwt)
    }

    /// Subject of a valid access token.
    pub fn authenticate(&self, access_token: &str) -> UserServiceResult<UserId> {
        self.token_service
            .validate_access(access_token)
            .map_err(|err| {
                log::debug!("Access token rejected: {}", err);
                UserServiceError::Unauthenticated
            })
    }
}
