// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpResponse, web};

use super::types::{MessageResponse, PasswordResetConfirmRequest, PasswordResetRequest};
use crate::error::ApiError;
use crate::iam::{PasswordResetService, RESET_COMPLETED_MESSAGE, RESET_REQUESTED_MESSAGE};

pub async fn request_reset(
    password_reset: web::Data<PasswordResetService>,
    payload: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse, ApiError> {
    let PasswordResetRequest { email } = payload.into_inner();

    // The snapshot write runs off the worker thread.
    let service = password_reset.clone();
    web::block(move || service.request_reset(&email)).await??;

    Ok(HttpResponse::Ok().json(MessageResponse::new(RESET_REQUESTED_MESSAGE)))
}

pub async fn confirm_reset(
    password_reset: web::Data<PasswordResetService>,
    payload: web::Json<PasswordResetConfirmRequest>,
) -> Result<HttpResponse, ApiError> {
    let PasswordResetConfirmRequest { token, password } = payload.into_inner();

    let service = password_reset.clone();
    web::block(move || service.confirm_reset(&token, &password)).await??;

    Ok(HttpResponse::Ok().json(MessageResponse::new(RESET_COMPLETED_MESSAGE)))
}
