// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpResponse, web};

use super::types::{LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, TokenResponse};
use crate::error::ApiError;
use crate::iam::UserServices;

pub async fn register(
    user_services: web::Data<UserServices>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload.into_inner();

    // Argon2 runs off the worker thread.
    let services = user_services.clone();
    let user = web::block(move || services.register(&username, &email, &password)).await??;

    Ok(HttpResponse::Created().json(RegisterResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        message: "User created successfully".to_string(),
    }))
}

pub async fn login(
    user_services: web::Data<UserServices>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { email, password } = payload.into_inner();

    let services = user_services.clone();
    let (user, pair) = web::block(move || services.login(&email, &password)).await??;
    log::info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
}

pub async fn refresh(
    user_services: web::Data<UserServices>,
    payload: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    let pair = user_services.refresh(&payload.refresh_token)?;
    Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
}
