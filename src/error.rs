// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::iam::{INVALID_RESET_TOKEN_MESSAGE, ResetError, UserServiceError};
use crate::store::StoreError;

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid email or password.";
pub const AUTHENTICATION_REQUIRED_MESSAGE: &str = "Authentication required.";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to modify this resource.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Everything a handler can fail with, as seen by the client.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    /// Missing or rejected bearer/refresh token.
    Authentication,
    /// Login with an unknown address or wrong password.
    InvalidCredentials,
    Authorization,
    NotFound(String),
    /// Detail is logged where the error is produced, never rendered.
    Internal,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Authentication | ApiError::InvalidCredentials => "unauthorized",
            ApiError::Authorization => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal => "internal_error",
        }
    }

    pub fn internal(context: &str, err: impl fmt::Display) -> Self {
        log::error!("{}: {}", context, err);
        ApiError::Internal
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(message) => write!(f, "{}", message),
            ApiError::Authentication => write!(f, "{}", AUTHENTICATION_REQUIRED_MESSAGE),
            ApiError::InvalidCredentials => write!(f, "{}", LOGIN_FAILED_MESSAGE),
            ApiError::Authorization => write!(f, "{}", FORBIDDEN_MESSAGE),
            ApiError::NotFound(message) => write!(f, "{}", message),
            ApiError::Internal => write!(f, "{}", INTERNAL_ERROR_MESSAGE),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Authorization => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        })
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(message) => ApiError::Validation(message),
            UserServiceError::InvalidCredentials => ApiError::InvalidCredentials,
            UserServiceError::Unauthenticated => ApiError::Authentication,
            other => ApiError::internal("User service failure", other),
        }
    }
}

impl From<ResetError> for ApiError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::InvalidToken => {
                ApiError::Validation(INVALID_RESET_TOKEN_MESSAGE.to_string())
            }
            ResetError::Validation(message) => ApiError::Validation(message),
            ResetError::Internal(message) => ApiError::internal("Password reset failure", message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal("Store failure", err)
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        ApiError::internal("Blocking task failed", err)
    }
}

/// Extractor configs that turn body and path failures into `{code, message}` 400s.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req: &HttpRequest| {
            log::debug!("Rejected JSON body: {}", err);
            ApiError::Validation("Invalid request body".to_string()).into()
        })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        log::debug!("Rejected path parameter: {}", err);
        ApiError::Validation("Invalid path parameter".to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        log::debug!("Rejected query string: {}", err);
        ApiError::Validation("Invalid query string".to_string()).into()
    })
}
