// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKERS: u16 = 4;
const DEFAULT_RELAY_ENDPOINT: &str = "http://127.0.0.1:8025/password-reset";

/// Writes a default `config.yaml` with a fresh signing secret unless one exists.
/// Returns whether a file was created.
pub fn ensure_config(root: &Path) -> Result<bool, BootstrapError> {
    let root_path = normalize_root(root)?;
    let config_path = root_path.join("config.yaml");

    if config_path.exists() {
        return Ok(false);
    }

    let jwt_secret = generate_jwt_secret();
    let contents = default_config_yaml(&jwt_secret);

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&config_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };

    file.write_all(contents.as_bytes())?;
    file.sync_all()?;

    log_action(format!(
        "created config.yaml (port {}, file storage, reset relay {})",
        DEFAULT_PORT, DEFAULT_RELAY_ENDPOINT
    ));

    Ok(true)
}

fn normalize_root(root: &Path) -> Result<PathBuf, BootstrapError> {
    let root_path = if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root.to_path_buf()
    };

    if root_path.exists() {
        if !root_path.is_dir() {
            return Err(BootstrapError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Runtime root is not a directory: {}", root_path.display()),
            )));
        }
        return Ok(root_path);
    }

    fs::create_dir_all(&root_path)?;
    log_action(format!(
        "created runtime root directory {}",
        root_path.display()
    ));
    Ok(root_path)
}

fn generate_jwt_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn default_config_yaml(jwt_secret: &str) -> String {
    format!(
        "server:\n  host: \"127.0.0.1\"\n  port: {port}\n  workers: {workers}\n\nlogging:\n  level: \"info\"\n\nauth:\n  jwt:\n    secret: \"{jwt_secret}\"\n    issuer: \"nop-blog\"\n    audience: \"nop-blog-clients\"\n    access_ttl_hours: 24\n    refresh_ttl_hours: 168\n\npassword_reset:\n  token_ttl_minutes: 60\n  frontend_url: \"http://localhost:3000\"\n\nnotifier:\n  kind: \"webhook\"\n  endpoint: \"{relay}\"\n  timeout_seconds: 10\n\nstorage:\n  kind: \"file\"\n  path: \"data/blog.yaml\"\n",
        port = DEFAULT_PORT,
        workers = DEFAULT_WORKERS,
        jwt_secret = jwt_secret,
        relay = DEFAULT_RELAY_ENDPOINT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, MIN_JWT_SECRET_BYTES, ValidatedNotifierConfig};

    #[test]
    fn default_config_parses_and_validates() {
        let secret = generate_jwt_secret();
        let config = Config::parse(&default_config_yaml(&secret)).expect("parse");
        let validated = config
            .validate(Path::new("/srv/blog"), None)
            .expect("validate");
        assert_eq!(validated.server.port, DEFAULT_PORT);
        assert_eq!(validated.jwt.secret, secret);
        assert_eq!(
            validated.notifier,
            ValidatedNotifierConfig::Webhook {
                endpoint: DEFAULT_RELAY_ENDPOINT.to_string(),
                timeout: std::time::Duration::from_secs(10),
            }
        );
    }

    #[test]
    fn generated_secrets_are_long_and_distinct() {
        let first = generate_jwt_secret();
        let second = generate_jwt_secret();
        assert_eq!(first.len(), 64);
        assert!(first.len() >= MIN_JWT_SECRET_BYTES);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
