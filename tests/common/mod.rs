// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::{App, web};
use async_trait::async_trait;
use nop_blog::api;
use nop_blog::app_state::AppServices;
use nop_blog::config::ValidatedConfig;
use nop_blog::iam::jwt::TokenPair;
use nop_blog::iam::{NotifierError, ResetNotification, ResetNotifier};
use nop_blog::store::{Credential, Database};
use nop_blog::util::TestConfigBuilder;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const ALICE_NAME: &str = "alice";
pub const ALICE_EMAIL: &str = "alice@example.com";
pub const BOB_NAME: &str = "bob";
pub const BOB_EMAIL: &str = "bob@example.com";
pub const PASSWORD: &str = "correct-horse-battery";

/// Captures reset links instead of mailing them.
pub struct RecordingNotifier {
    sender: mpsc::UnboundedSender<ResetNotification>,
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn send_reset(&self, notification: &ResetNotification) -> Result<(), NotifierError> {
        self.sender
            .send(notification.clone())
            .map_err(|err| NotifierError::DeliveryError(err.to_string()))
    }
}

pub struct TestHarness {
    pub config: ValidatedConfig,
    pub database: Arc<Database>,
    pub services: AppServices,
    deliveries: mpsc::UnboundedReceiver<ResetNotification>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(TestConfigBuilder::new().build())
    }

    pub fn with_config(config: ValidatedConfig) -> Self {
        let database = Arc::new(Database::in_memory());
        let (sender, deliveries) = mpsc::unbounded_channel();
        let services = AppServices::build(
            &config,
            database.clone(),
            Arc::new(RecordingNotifier { sender }),
        )
        .expect("app services");
        Self {
            config,
            database,
            services,
            deliveries,
        }
    }

    pub fn register(&self, username: &str, email: &str) -> Credential {
        self.services
            .user_services
            .register(username, email, PASSWORD)
            .expect("register user")
    }

    pub fn login(&self, email: &str, password: &str) -> TokenPair {
        let (_, pair) = self
            .services
            .user_services
            .login(email, password)
            .expect("login");
        pair
    }

    /// Registers a user and returns it with a fresh token pair.
    pub fn session(&self, username: &str, email: &str) -> (Credential, TokenPair) {
        let user = self.register(username, email);
        let pair = self.login(email, PASSWORD);
        (user, pair)
    }

    /// Waits for the next background delivery.
    pub async fn next_delivery(&mut self) -> Option<ResetNotification> {
        tokio::time::timeout(Duration::from_secs(2), self.deliveries.recv())
            .await
            .ok()
            .flatten()
    }

    /// True when nothing is delivered within a short grace period.
    pub async fn no_delivery(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(200), self.deliveries.recv())
            .await
            .is_err()
    }
}

pub fn build_test_app(
    services: AppServices,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .configure(move |cfg| services.register(cfg))
        .configure(api::configure)
        .default_service(web::route().to(api::not_found))
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn token_from_link(link: &str) -> String {
    link.split("token=")
        .nth(1)
        .expect("token in reset link")
        .to_string()
}

pub async fn read_json(resp: ServiceResponse) -> Value {
    let body = actix_web::test::read_body(resp).await;
    serde_json::from_slice(&body).expect("json body")
}

pub fn error_code(json: &Value) -> Option<&str> {
    json.get("code").and_then(Value::as_str)
}
