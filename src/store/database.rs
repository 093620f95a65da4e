// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::snapshot::{MemorySnapshotStore, SnapshotStore};
use super::types::{
    BlogData, Credential, NewCredential, NewPost, NewResetToken, Post, PostId, PostUpdate,
    ResetToken, StoreError, UserId, normalize_email,
};
use super::{CredentialStore, PostStore, ResetTokenStore};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

/// In-memory data set backed by a snapshot store.
///
/// Every mutation works on a copy, persists it, and only then replaces the
/// live data, so a failed save never leaves memory ahead of disk.
#[derive(Clone)]
pub struct Database {
    data: Arc<RwLock<BlogData>>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl Database {
    pub fn open(snapshots: Arc<dyn SnapshotStore>) -> Result<Self, StoreError> {
        let data = snapshots.load()?;
        log::debug!(
            "Loaded {} user(s), {} post(s), {} reset token(s)",
            data.users.len(),
            data.posts.len(),
            data.reset_tokens.len()
        );
        Ok(Self {
            data: Arc::new(RwLock::new(data)),
            snapshots,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            data: Arc::new(RwLock::new(BlogData::default())),
            snapshots: Arc::new(MemorySnapshotStore::default()),
        }
    }

    fn with_read<T>(
        &self,
        f: impl FnOnce(&BlogData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match self.data.read() {
            Ok(guard) => f(&guard),
            Err(_) => {
                log::error!("Data lock poisoned on read; reloading from snapshot");
                drop(self.write_guard()?);
                let guard = self.data.read().map_err(|_| {
                    StoreError::ConfigurationError(
                        "Data lock poisoned after recovery attempt".to_string(),
                    )
                })?;
                f(&guard)
            }
        }
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, BlogData>, StoreError> {
        match self.data.write() {
            Ok(guard) => Ok(guard),
            Err(poisoned) => {
                log::error!("Data lock poisoned on write; reloading from snapshot");
                let mut guard = poisoned.into_inner();
                *guard = self.snapshots.load()?;
                self.data.clear_poison();
                Ok(guard)
            }
        }
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut BlogData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.write_guard()?;
        let mut updated = guard.clone();
        let result = f(&mut updated)?;
        self.snapshots.save(&updated)?;
        *guard = updated;
        Ok(result)
    }
}

fn page(mut posts: Vec<Post>, limit: usize, offset: usize) -> Vec<Post> {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    posts.into_iter().skip(offset).take(limit).collect()
}

impl CredentialStore for Database {
    fn create_user(&self, user: NewCredential) -> Result<Credential, StoreError> {
        let email = normalize_email(&user.email);
        self.mutate(|data| {
            if data.users.values().any(|existing| existing.email == email) {
                return Err(StoreError::Conflict("e-mail already registered".to_string()));
            }
            let now = Utc::now();
            let id = data.sequences.next_user();
            let credential = Credential {
                id,
                username: user.username,
                email,
                password_digest: user.password_digest,
                created_at: now,
                updated_at: now,
            };
            data.users.insert(id, credential.clone());
            Ok(credential)
        })
    }

    fn user_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let email = normalize_email(email);
        self.with_read(|data| {
            Ok(data
                .users
                .values()
                .find(|user| user.email == email)
                .cloned())
        })
    }

    fn user_by_id(&self, id: UserId) -> Result<Option<Credential>, StoreError> {
        self.with_read(|data| Ok(data.users.get(&id).cloned()))
    }

    fn update_password(&self, id: UserId, password_digest: &str) -> Result<(), StoreError> {
        self.mutate(|data| {
            let user = data
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
            user.password_digest = password_digest.to_string();
            user.updated_at = Utc::now();
            Ok(())
        })
    }
}

impl PostStore for Database {
    fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        self.mutate(|data| {
            let now = Utc::now();
            let id = data.sequences.next_post();
            let created = Post {
                id,
                title: post.title,
                body: post.body,
                author_id: post.author_id,
                created_at: now,
                updated_at: now,
            };
            data.posts.insert(id, created.clone());
            Ok(created)
        })
    }

    fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        self.with_read(|data| Ok(data.posts.get(&id).cloned()))
    }

    fn update_post(
        &self,
        id: PostId,
        author_id: UserId,
        update: PostUpdate,
    ) -> Result<Post, StoreError> {
        self.mutate(|data| {
            let post = data
                .posts
                .get_mut(&id)
                .filter(|post| post.author_id == author_id)
                .ok_or_else(|| StoreError::NotFound(format!("post {}", id)))?;
            post.title = update.title;
            post.body = update.body;
            post.updated_at = Utc::now();
            Ok(post.clone())
        })
    }

    fn list_posts(&self, limit: usize, offset: usize) -> Result<Vec<Post>, StoreError> {
        self.with_read(|data| Ok(page(data.posts.values().cloned().collect(), limit, offset)))
    }

    fn list_posts_by_author(
        &self,
        author_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, StoreError> {
        self.with_read(|data| {
            let posts = data
                .posts
                .values()
                .filter(|post| post.author_id == author_id)
                .cloned()
                .collect();
            Ok(page(posts, limit, offset))
        })
    }
}

impl ResetTokenStore for Database {
    fn insert_reset_token(&self, token: NewResetToken) -> Result<ResetToken, StoreError> {
        self.mutate(|data| {
            if !data.users.contains_key(&token.user_id) {
                return Err(StoreError::NotFound(format!("user {}", token.user_id)));
            }
            let id = data.sequences.next_reset_token();
            let row = ResetToken {
                id,
                user_id: token.user_id,
                token_digest: token.token_digest,
                created_at: token.created_at,
                expires_at: token.expires_at,
                used: false,
                used_at: None,
            };
            data.reset_tokens.insert(id, row.clone());
            Ok(row)
        })
    }

    fn reset_token_by_digest(&self, token_digest: &str) -> Result<Option<ResetToken>, StoreError> {
        self.with_read(|data| {
            Ok(data
                .reset_tokens
                .values()
                .find(|row| row.token_digest == token_digest)
                .cloned())
        })
    }

    fn persist_unchanged(&self) -> Result<(), StoreError> {
        self.mutate(|_| Ok(()))
    }

    fn consume_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, StoreError> {
        // Check and mark under one write guard.
        let mut guard = self.write_guard()?;
        let claimable = guard
            .reset_tokens
            .values()
            .find(|row| row.token_digest == token_digest)
            .filter(|row| !row.used && !row.is_expired(now))
            .map(|row| row.id);
        let Some(id) = claimable else {
            return Ok(None);
        };

        let mut updated = guard.clone();
        let claimed = match updated.reset_tokens.get_mut(&id) {
            Some(row) => {
                row.used = true;
                row.used_at = Some(now);
                row.clone()
            }
            None => return Ok(None),
        };
        self.snapshots.save(&updated)?;
        *guard = updated;
        Ok(Some(claimed))
    }
}
