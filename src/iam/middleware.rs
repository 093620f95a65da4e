// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{Error, HttpMessage, HttpRequest, ResponseError};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

use crate::error::ApiError;
use crate::iam::user_services::UserServices;
use crate::store::UserId;

/// Verified caller identity, scoped to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
}

/// Trait to add authentication methods to HttpRequest
pub trait AuthRequest {
    fn authenticated_user(&self) -> Option<AuthenticatedUser>;

    fn subject_id(&self) -> Option<UserId> {
        self.authenticated_user().map(|user| user.id)
    }
}

impl AuthRequest for HttpRequest {
    fn authenticated_user(&self) -> Option<AuthenticatedUser> {
        self.extensions().get::<AuthenticatedUser>().copied()
    }
}

/// Token from an `Authorization: Bearer <token>` value; anything else is `None`.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Guards a route with an access token. Rejections are rendered here as
/// `{code, message}` responses; the wrapped handler never runs.
pub struct BearerAuthMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for BearerAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
}

fn reject<B>(req: ServiceRequest, error: ApiError) -> ServiceResponse<EitherBody<B>> {
    let (req, _) = req.into_parts();
    let response = error.error_response().map_into_right_body();
    ServiceResponse::new(req, response)
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user_services = req.app_data::<Data<UserServices>>().cloned();
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);
        let service = self.service.clone();

        Box::pin(async move {
            let Some(user_services) = user_services else {
                log::error!("Bearer guard mounted without UserServices app data");
                return Ok(reject(req, ApiError::Internal));
            };
            let Some(token) = token else {
                log::debug!("Missing or malformed Authorization header on {}", req.path());
                return Ok(reject(req, ApiError::Authentication));
            };

            match user_services.authenticate(&token) {
                Ok(id) => {
                    req.extensions_mut().insert(AuthenticatedUser { id });
                }
                Err(_) => return Ok(reject(req, ApiError::Authentication)),
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}
