// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use validator::ValidateEmail;

pub const MAX_EMAIL_CHARS: usize = 128;
pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 50;
pub const MIN_PASSWORD_CHARS: usize = 1;
pub const MAX_PASSWORD_CHARS: usize = 128;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 100_000;

/// Validate user email input
pub fn validate_email_field(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Email is required".to_string());
    }
    if trimmed.chars().count() > MAX_EMAIL_CHARS {
        return Err(format!(
            "Email must be at most {} characters",
            MAX_EMAIL_CHARS
        ));
    }
    if !trimmed.validate_email() {
        return Err("Email format is invalid".to_string());
    }
    Ok(())
}

/// Usernames are public (shown as post authors): letters, digits, dots, dashes and underscores.
pub fn validate_username(username: &str) -> Result<String, String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err("Username is required".to_string());
    }

    let len = trimmed.chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&len) {
        return Err(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
        ));
    }

    for char in trimmed.chars() {
        if !char.is_alphanumeric() && char != '_' && char != '-' && char != '.' {
            return Err(
                "Username can only contain letters, numbers, dots, dashes, and underscores"
                    .to_string(),
            );
        }
    }

    Ok(trimmed.to_string())
}

/// New passwords must be non-empty and bounded. Whitespace is significant and kept as typed.
pub fn validate_new_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_CHARS {
        return Err("Password is required".to_string());
    }
    if len > MAX_PASSWORD_CHARS {
        return Err(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_CHARS
        ));
    }
    Ok(())
}

pub fn validate_post_fields(title: &str, body: &str) -> Result<(), String> {
    let title_len = title.trim().chars().count();
    if title_len == 0 {
        return Err("Title is required".to_string());
    }
    if title_len > MAX_TITLE_CHARS {
        return Err(format!(
            "Title must be at most {} characters",
            MAX_TITLE_CHARS
        ));
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(format!("Body must be at most {} characters", MAX_BODY_CHARS));
    }
    Ok(())
}
