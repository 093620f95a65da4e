// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web;
use std::fmt;
use std::sync::Arc;

use crate::config::ValidatedConfig;
use crate::iam::{
    Argon2Hasher, PasswordHashing, PasswordResetService, ResetNotifier, UserServices,
};
use crate::store::{Database, PostStore};

pub struct AppState {
    pub posts: Arc<dyn PostStore>,
}

#[derive(Debug)]
pub struct ServiceInitError(String);

impl fmt::Display for ServiceInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ServiceInitError {}

/// Everything the HTTP layer reads from `app_data`, built once and shared by all workers.
#[derive(Clone)]
pub struct AppServices {
    pub state: web::Data<AppState>,
    pub user_services: web::Data<UserServices>,
    pub password_reset: web::Data<PasswordResetService>,
}

impl AppServices {
    pub fn build(
        config: &ValidatedConfig,
        database: Arc<Database>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Result<Self, ServiceInitError> {
        let hasher: Arc<dyn PasswordHashing> = Arc::new(
            Argon2Hasher::new(&config.password)
                .map_err(|err| ServiceInitError(format!("password hasher: {}", err)))?,
        );

        let user_services = UserServices::new(&config.jwt, database.clone(), hasher.clone())
            .map_err(|err| ServiceInitError(format!("user services: {}", err)))?;

        let password_reset = PasswordResetService::new(
            database.clone(),
            database.clone(),
            hasher,
            notifier,
            &config.password_reset,
        )
        .map_err(|err| ServiceInitError(format!("password reset: {}", err)))?;

        Ok(Self {
            state: web::Data::new(AppState { posts: database }),
            user_services: web::Data::new(user_services),
            password_reset: web::Data::new(password_reset),
        })
    }

    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.state.clone())
            .app_data(self.user_services.clone())
            .app_data(self.password_reset.clone());
    }
}
