// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type UserId = i64;
pub type PostId = i64;
pub type ResetTokenId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credential {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub email: String,
    pub password_digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub author_id: UserId,
}

#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResetToken {
    pub id: ResetTokenId,
    pub user_id: UserId,
    /// SHA-256 hex digest of the token handed to the user
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

impl ResetToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewResetToken {
    pub user_id: UserId,
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Everything the service persists, keyed by id.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlogData {
    #[serde(default)]
    pub users: BTreeMap<UserId, Credential>,
    #[serde(default)]
    pub posts: BTreeMap<PostId, Post>,
    #[serde(default)]
    pub reset_tokens: BTreeMap<ResetTokenId, ResetToken>,
    #[serde(default)]
    pub sequences: Sequences,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Sequences {
    #[serde(default)]
    pub users: i64,
    #[serde(default)]
    pub posts: i64,
    #[serde(default)]
    pub reset_tokens: i64,
}

impl Sequences {
    pub fn next_user(&mut self) -> UserId {
        self.users += 1;
        self.users
    }

    pub fn next_post(&mut self) -> PostId {
        self.posts += 1;
        self.posts
    }

    pub fn next_reset_token(&mut self) -> ResetTokenId {
        self.reset_tokens += 1;
        self.reset_tokens
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(String),
    Conflict(String),
    FileError(String),
    ParseError(String),
    ConfigurationError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "Not found: {}", what),
            StoreError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            StoreError::FileError(msg) => write!(f, "File error: {}", msg),
            StoreError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            StoreError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
