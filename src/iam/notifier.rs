// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ValidatedNotifierConfig;

#[derive(Debug)]
pub enum NotifierError {
    ConfigurationError(String),
    DeliveryError(String),
}

impl std::fmt::Display for NotifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifierError::ConfigurationError(msg) => {
                write!(f, "Notifier configuration error: {}", msg)
            }
            NotifierError::DeliveryError(msg) => write!(f, "Notification delivery failed: {}", msg),
        }
    }
}

impl std::error::Error for NotifierError {}

/// A reset link on its way to the account owner.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResetNotification {
    pub email: String,
    pub reset_link: String,
    pub expires_in_minutes: u64,
}

/// Out-of-band delivery of password reset links.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset(&self, notification: &ResetNotification) -> Result<(), NotifierError>;
}

/// Records that a reset was issued without delivering it. The link carries a
/// live credential, so it is never written to the log.
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn send_reset(&self, notification: &ResetNotification) -> Result<(), NotifierError> {
        log::info!(
            "Password reset issued for {} (valid {} min); link withheld, no delivery configured",
            notification.email,
            notification.expires_in_minutes
        );
        Ok(())
    }
}

/// POSTs the notification as JSON to a relay endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::ConfigurationError(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl ResetNotifier for WebhookNotifier {
    async fn send_reset(&self, notification: &ResetNotification) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await
            .map_err(|e| NotifierError::DeliveryError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::DeliveryError(format!(
                "relay answered HTTP {}",
                status
            )));
        }
        log::debug!("Reset notification relayed to {}", self.endpoint);
        Ok(())
    }
}

pub fn build_notifier(
    config: &ValidatedNotifierConfig,
) -> Result<Arc<dyn ResetNotifier>, NotifierError> {
    match config {
        ValidatedNotifierConfig::Log => Ok(Arc::new(LogNotifier)),
        ValidatedNotifierConfig::Webhook { endpoint, timeout } => {
            Ok(Arc::new(WebhookNotifier::new(endpoint, *timeout)?))
        }
    }
}
