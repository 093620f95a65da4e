// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    Argon2Params, LoggingConfig, ServerConfig, ValidatedConfig, ValidatedJwtConfig,
    ValidatedNotifierConfig, ValidatedPasswordResetConfig, ValidatedStorageConfig,
};

pub const TEST_JWT_SECRET: &str = "test-secret-test-secret-test-secret";

/// Cheap argon2 parameters so tests do not spend seconds hashing.
pub const TEST_ARGON2_PARAMS: Argon2Params = Argon2Params {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5466,
                    workers: 1,
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                },
                jwt: ValidatedJwtConfig {
                    secret: TEST_JWT_SECRET.to_string(),
                    issuer: "nop-blog".to_string(),
                    audience: "nop-blog-clients".to_string(),
                    access_ttl: Duration::from_secs(24 * 3600),
                    refresh_ttl: Duration::from_secs(7 * 24 * 3600),
                },
                password: TEST_ARGON2_PARAMS,
                password_reset: ValidatedPasswordResetConfig {
                    token_ttl: Duration::from_secs(3600),
                    frontend_url: "http://localhost:3000".to_string(),
                },
                notifier: ValidatedNotifierConfig::Log,
                storage: ValidatedStorageConfig::Memory,
            },
        }
    }

    pub fn with_jwt_secret(mut self, secret: &str) -> Self {
        self.config.jwt.secret = secret.to_string();
        self
    }

    pub fn with_reset_ttl(mut self, ttl: Duration) -> Self {
        self.config.password_reset.token_ttl = ttl;
        self
    }

    pub fn with_file_storage(mut self, path: PathBuf) -> Self {
        self.config.storage = ValidatedStorageConfig::File(path);
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}
