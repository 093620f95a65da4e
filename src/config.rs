// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const JWT_SECRET_ENV: &str = "NOP_BLOG_JWT_SECRET";
pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub password_reset: PasswordResetConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub jwt: ValidatedJwtConfig,
    pub password: Argon2Params,
    pub password_reset: ValidatedPasswordResetConfig,
    pub notifier: ValidatedNotifierConfig,
    pub storage: ValidatedStorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: Argon2ParamsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JwtConfig {
    /// May be left out when NOP_BLOG_JWT_SECRET is set
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    #[serde(default = "default_jwt_audience")]
    pub audience: String,
    #[serde(default = "default_access_ttl_hours")]
    pub access_ttl_hours: u64,
    #[serde(default = "default_refresh_ttl_hours")]
    pub refresh_ttl_hours: u64,
}

#[derive(Debug, Clone)]
pub struct ValidatedJwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Argon2ParamsConfig {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

pub const DEFAULT_ARGON2_PARAMS: Argon2Params = Argon2Params {
    memory_kib: 65536,
    iterations: 2,
    parallelism: 1,
};

impl Argon2Params {
    fn resolve(config: &Argon2ParamsConfig) -> Result<Self, ConfigError> {
        let resolved = Argon2Params {
            memory_kib: config
                .memory_kib
                .unwrap_or(DEFAULT_ARGON2_PARAMS.memory_kib),
            iterations: config
                .iterations
                .unwrap_or(DEFAULT_ARGON2_PARAMS.iterations),
            parallelism: config
                .parallelism
                .unwrap_or(DEFAULT_ARGON2_PARAMS.parallelism),
        };

        if resolved.memory_kib == 0 || resolved.iterations == 0 || resolved.parallelism == 0 {
            return Err(ConfigError::ValidationError(
                "Argon2id params must be non-zero".to_string(),
            ));
        }

        if let Err(err) = argon2::Params::new(
            resolved.memory_kib,
            resolved.iterations,
            resolved.parallelism,
            None,
        ) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid Argon2id params: {}",
                err
            )));
        }

        Ok(resolved)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PasswordResetConfig {
    #[serde(default = "default_reset_token_ttl_minutes")]
    pub token_ttl_minutes: u64,
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: default_reset_token_ttl_minutes(),
            frontend_url: default_frontend_url(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedPasswordResetConfig {
    pub token_ttl: Duration,
    pub frontend_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Webhook,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedNotifierConfig {
    Log,
    Webhook { endpoint: String, timeout: Duration },
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub kind: StorageKind,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedStorageConfig {
    Memory,
    File(PathBuf),
}

fn default_jwt_issuer() -> String {
    "nop-blog".to_string()
}

fn default_jwt_audience() -> String {
    "nop-blog-clients".to_string()
}

fn default_access_ttl_hours() -> u64 {
    24
}

fn default_refresh_ttl_hours() -> u64 {
    24 * 7
}

fn default_reset_token_ttl_minutes() -> u64 {
    60
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_notifier_timeout_seconds() -> u64 {
    10
}

fn default_storage_path() -> String {
    "data/blog.yaml".to_string()
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.yaml");
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::parse(&config_content).map_err(|e| match e {
            ConfigError::LoadError(msg) => ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        let config = Self::load(root)?;
        let env_secret = std::env::var(JWT_SECRET_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        config.validate(root, env_secret)
    }

    pub fn validate(
        self,
        root: &Path,
        env_secret: Option<String>,
    ) -> Result<ValidatedConfig, ConfigError> {
        let jwt = Self::validate_jwt(&self.auth.jwt, env_secret)?;
        let password = Argon2Params::resolve(&self.auth.password)?;
        Self::validate_logging(&self.logging)?;

        if self.server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }

        if self.password_reset.token_ttl_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "password_reset.token_ttl_minutes must be at least 1".to_string(),
            ));
        }
        let frontend_url = self.password_reset.frontend_url.trim_end_matches('/');
        if !frontend_url.starts_with("http://") && !frontend_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(
                "password_reset.frontend_url must start with http:// or https://".to_string(),
            ));
        }
        let password_reset = ValidatedPasswordResetConfig {
            token_ttl: Duration::from_secs(self.password_reset.token_ttl_minutes * 60),
            frontend_url: frontend_url.to_string(),
        };

        let notifier = Self::validate_notifier(&self.notifier)?;

        let storage = match self.storage.kind {
            StorageKind::Memory => {
                log::warn!("Storage kind 'memory' selected; data will not survive a restart");
                ValidatedStorageConfig::Memory
            }
            StorageKind::File => {
                if self.storage.path.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "storage.path is required for file storage".to_string(),
                    ));
                }
                let path = PathBuf::from(&self.storage.path);
                let path = if path.is_absolute() {
                    path
                } else {
                    root.join(path)
                };
                ValidatedStorageConfig::File(path)
            }
        };

        Ok(ValidatedConfig {
            server: self.server,
            logging: self.logging,
            jwt,
            password,
            password_reset,
            notifier,
            storage,
        })
    }

    fn validate_jwt(
        jwt: &JwtConfig,
        env_secret: Option<String>,
    ) -> Result<ValidatedJwtConfig, ConfigError> {
        let secret = match (env_secret, jwt.secret.as_ref()) {
            (Some(secret), _) => secret,
            (None, Some(secret)) => secret.clone(),
            (None, None) => {
                return Err(ConfigError::ValidationError(format!(
                    "auth.jwt.secret is required (or set {})",
                    JWT_SECRET_ENV
                )));
            }
        };

        if secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::ValidationError(format!(
                "JWT secret must be at least {} bytes, got {}",
                MIN_JWT_SECRET_BYTES,
                secret.len()
            )));
        }

        if jwt.access_ttl_hours == 0 || jwt.refresh_ttl_hours == 0 {
            return Err(ConfigError::ValidationError(
                "JWT token lifetimes must be at least 1 hour".to_string(),
            ));
        }

        if jwt.refresh_ttl_hours < jwt.access_ttl_hours {
            log::warn!(
                "JWT refresh_ttl_hours ({}) is shorter than access_ttl_hours ({})",
                jwt.refresh_ttl_hours,
                jwt.access_ttl_hours
            );
        }

        Ok(ValidatedJwtConfig {
            secret,
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            access_ttl: Duration::from_secs(jwt.access_ttl_hours * 3600),
            refresh_ttl: Duration::from_secs(jwt.refresh_ttl_hours * 3600),
        })
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        match logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown logging level '{}'",
                other
            ))),
        }
    }

    fn validate_notifier(
        notifier: &NotifierConfig,
    ) -> Result<ValidatedNotifierConfig, ConfigError> {
        match notifier.kind {
            NotifierKind::Log => Ok(ValidatedNotifierConfig::Log),
            NotifierKind::Webhook => {
                let endpoint = notifier
                    .endpoint
                    .as_deref()
                    .map(str::trim)
                    .filter(|endpoint| !endpoint.is_empty())
                    .ok_or_else(|| {
                        ConfigError::ValidationError(
                            "notifier.endpoint is required for the webhook notifier".to_string(),
                        )
                    })?;
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err(ConfigError::ValidationError(
                        "notifier.endpoint must start with http:// or https://".to_string(),
                    ));
                }
                let timeout_seconds = notifier
                    .timeout_seconds
                    .unwrap_or_else(default_notifier_timeout_seconds);
                if timeout_seconds == 0 {
                    return Err(ConfigError::ValidationError(
                        "notifier.timeout_seconds must be at least 1".to_string(),
                    ));
                }
                Ok(ValidatedNotifierConfig::Webhook {
                    endpoint: endpoint.to_string(),
                    timeout: Duration::from_secs(timeout_seconds),
                })
            }
        }
    }
}

impl ValidatedConfig {
    pub fn bind_address(&self) -> (&str, u16) {
        (self.server.host.as_str(), self.server.port)
    }
}
