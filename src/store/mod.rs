// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod database;
mod snapshot;
pub mod types;

use chrono::{DateTime, Utc};

pub use database::Database;
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use types::{
    BlogData, Credential, NewCredential, NewPost, NewResetToken, Post, PostId, PostUpdate,
    ResetToken, StoreError, UserId, normalize_email,
};

/// Accounts and their password digests.
pub trait CredentialStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the e-mail is already registered.
    fn create_user(&self, user: NewCredential) -> Result<Credential, StoreError>;
    fn user_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError>;
    fn user_by_id(&self, id: UserId) -> Result<Option<Credential>, StoreError>;
    fn update_password(&self, id: UserId, password_digest: &str) -> Result<(), StoreError>;
}

pub trait PostStore: Send + Sync {
    fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;
    fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError>;
    /// Only applies when `author_id` still owns the post; otherwise `StoreError::NotFound`.
    fn update_post(
        &self,
        id: PostId,
        author_id: UserId,
        update: PostUpdate,
    ) -> Result<Post, StoreError>;
    /// Newest first.
    fn list_posts(&self, limit: usize, offset: usize) -> Result<Vec<Post>, StoreError>;
    fn list_posts_by_author(
        &self,
        author_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, StoreError>;
}

pub trait ResetTokenStore: Send + Sync {
    fn insert_reset_token(&self, token: NewResetToken) -> Result<ResetToken, StoreError>;
    fn reset_token_by_digest(&self, token_digest: &str) -> Result<Option<ResetToken>, StoreError>;
    /// Writes the current state back unchanged, through the same path as an insert.
    fn persist_unchanged(&self) -> Result<(), StoreError>;
    /// Atomically claims a token: succeeds for exactly one caller while the row
    /// exists, is unused and `now <= expires_at`. Returns the claimed row.
    fn consume_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, StoreError>;
}
