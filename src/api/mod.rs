// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web;

use crate::error::{ApiError, json_config, path_config, query_config};
use crate::iam::BearerAuthMiddlewareFactory;

mod auth;
mod password_reset;
mod posts;
pub mod types;

/// Mount every endpoint. Only the mutating post routes sit behind the bearer guard.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .route("/register", web::post().to(auth::register))
        .route("/login", web::post().to(auth::login))
        .route("/refresh", web::post().to(auth::refresh))
        .route(
            "/password-reset",
            web::post().to(password_reset::request_reset),
        )
        .route(
            "/password-reset/confirm",
            web::post().to(password_reset::confirm_reset),
        )
        .service(
            web::resource("/posts")
                .route(web::get().to(posts::list_posts))
                .route(
                    web::post()
                        .to(posts::create_post)
                        .wrap(BearerAuthMiddlewareFactory),
                ),
        )
        .service(
            web::resource("/posts/{id}")
                .route(web::get().to(posts::get_post))
                .route(
                    web::put()
                        .to(posts::update_post)
                        .wrap(BearerAuthMiddlewareFactory),
                ),
        )
        .route("/users/{id}/posts", web::get().to(posts::list_user_posts));
}

/// Fallback for unknown routes, so every error body has the same shape.
pub async fn not_found() -> Result<actix_web::HttpResponse, ApiError> {
    Err(ApiError::NotFound("Resource not found".to_string()))
}
