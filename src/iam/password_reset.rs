// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{Duration, Utc};
use std::fmt;
use std::sync::Arc;

use super::notifier::{ResetNotification, ResetNotifier};
use super::password::PasswordHashing;
use super::password_tokens::{digest_reset_token, generate_reset_token, is_well_formed};
use crate::config::ValidatedPasswordResetConfig;
use crate::security::{validate_email_field, validate_new_password};
use crate::store::{CredentialStore, NewResetToken, ResetTokenStore};

pub const RESET_REQUESTED_MESSAGE: &str =
    "If your email exists in our system, you will receive reset instructions";
pub const RESET_COMPLETED_MESSAGE: &str = "Password has been successfully reset";
pub const INVALID_RESET_TOKEN_MESSAGE: &str = "Invalid or expired token";

#[derive(Debug)]
pub enum ResetError {
    /// Malformed, unknown, used or expired; callers cannot tell which.
    InvalidToken,
    Validation(String),
    Internal(String),
}

impl fmt::Display for ResetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetError::InvalidToken => write!(f, "{}", INVALID_RESET_TOKEN_MESSAGE),
            ResetError::Validation(message) => write!(f, "{}", message),
            ResetError::Internal(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ResetError {}

/// Issues, delivers and consumes single-use password reset tokens.
///
/// Tokens live `token_ttl` from creation; expiry is checked lazily at
/// consumption and rows are never deleted.
pub struct PasswordResetService {
    credentials: Arc<dyn CredentialStore>,
    reset_tokens: Arc<dyn ResetTokenStore>,
    hasher: Arc<dyn PasswordHashing>,
    notifier: Arc<dyn ResetNotifier>,
    token_ttl: Duration,
    frontend_url: String,
}

impl PasswordResetService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        reset_tokens: Arc<dyn ResetTokenStore>,
        hasher: Arc<dyn PasswordHashing>,
        notifier: Arc<dyn ResetNotifier>,
        config: &ValidatedPasswordResetConfig,
    ) -> Result<Self, ResetError> {
        let token_ttl = Duration::from_std(config.token_ttl)
            .map_err(|err| ResetError::Internal(err.to_string()))?;
        Ok(Self {
            credentials,
            reset_tokens,
            hasher,
            notifier,
            token_ttl,
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    /// Starts a reset for `email`. Succeeds identically whether or not the
    /// address is registered or even well formed; only persistence failures
    /// surface. Unmatched requests still write a snapshot so both paths cost
    /// the same.
    ///
    /// Delivery is spawned onto the current Tokio runtime, so this must be
    /// called from within one (including `web::block` threads).
    pub fn request_reset(&self, email: &str) -> Result<(), ResetError> {
        let issued = generate_reset_token();

        let user = if validate_email_field(email).is_ok() {
            self.credentials
                .user_by_email(email)
                .map_err(|err| ResetError::Internal(err.to_string()))?
        } else {
            None
        };
        let Some(user) = user else {
            log::debug!("Password reset requested for an unregistered address");
            return self
                .reset_tokens
                .persist_unchanged()
                .map_err(|err| ResetError::Internal(err.to_string()));
        };

        let now = Utc::now();
        self.reset_tokens
            .insert_reset_token(NewResetToken {
                user_id: user.id,
                token_digest: issued.digest,
                created_at: now,
                expires_at: now + self.token_ttl,
            })
            .map_err(|err| ResetError::Internal(err.to_string()))?;
        log::info!("Password reset token issued for user {}", user.id);

        self.dispatch(
            user.id,
            ResetNotification {
                email: user.email,
                reset_link: self.reset_link(&issued.token),
                expires_in_minutes: self.token_ttl.num_minutes().max(0) as u64,
            },
        );
        Ok(())
    }

    fn dispatch(&self, user_id: i64, notification: ResetNotification) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(err) = notifier.send_reset(&notification).await {
                log::error!(
                    "Failed to deliver password reset for user {}: {}",
                    user_id,
                    err
                );
            }
        });
    }

    /// Redeems `token` and replaces the account password.
    ///
    /// The token is claimed before the credential changes, so concurrent
    /// confirmations of one token update the password at most once.
    pub fn confirm_reset(&self, token: &str, new_password: &str) -> Result<(), ResetError> {
        if !is_well_formed(token) {
            return Err(ResetError::InvalidToken);
        }
        validate_new_password(new_password).map_err(ResetError::Validation)?;

        let password_digest = self
            .hasher
            .hash(new_password)
            .map_err(|err| ResetError::Internal(err.to_string()))?;

        let claimed = self
            .reset_tokens
            .consume_reset_token(&digest_reset_token(token), Utc::now())
            .map_err(|err| ResetError::Internal(err.to_string()))?
            .ok_or(ResetError::InvalidToken)?;

        self.credentials
            .update_password(claimed.user_id, &password_digest)
            .map_err(|err| {
                log::error!(
                    "Reset token {} claimed but password update failed for user {}: {}",
                    claimed.id,
                    claimed.user_id,
                    err
                );
                ResetError::Internal(err.to_string())
            })?;

        log::info!("Password reset completed for user {}", claimed.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::notifier::NotifierError;
    use crate::iam::password::{Argon2Hasher, test_params};
    use crate::store::{
        BlogData, Database, FileSnapshotStore, NewCredential, SnapshotStore, StoreError,
    };
    use std::time::Instant;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct ChannelNotifier {
        sender: mpsc::UnboundedSender<ResetNotification>,
    }

    #[async_trait]
    impl ResetNotifier for ChannelNotifier {
        async fn send_reset(&self, notification: &ResetNotification) -> Result<(), NotifierError> {
            let _ = self.sender.send(notification.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl ResetNotifier for FailingNotifier {
        async fn send_reset(&self, _: &ResetNotification) -> Result<(), NotifierError> {
            Err(NotifierError::DeliveryError("relay down".to_string()))
        }
    }

    struct Fixture {
        db: Arc<Database>,
        hasher: Arc<Argon2Hasher>,
        service: PasswordResetService,
        deliveries: mpsc::UnboundedReceiver<ResetNotification>,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::in_memory());
        let hasher = Arc::new(Argon2Hasher::new(&test_params()).expect("hasher"));
        let (sender, deliveries) = mpsc::unbounded_channel();
        let service = PasswordResetService::new(
            db.clone(),
            db.clone(),
            hasher.clone(),
            Arc::new(ChannelNotifier { sender }),
            &ValidatedPasswordResetConfig {
                token_ttl: std::time::Duration::from_secs(3600),
                frontend_url: "http://localhost:3000/".to_string(),
            },
        )
        .expect("service");
        Fixture {
            db,
            hasher,
            service,
            deliveries,
        }
    }

    fn register(fixture: &Fixture, email: &str, password: &str) -> i64 {
        fixture
            .db
            .create_user(NewCredential {
                username: "alice".to_string(),
                email: email.to_string(),
                password_digest: fixture.hasher.hash(password).expect("hash"),
            })
            .expect("user")
            .id
    }

    fn token_from_link(link: &str) -> String {
        link.split("token=").nth(1).expect("token param").to_string()
    }

    #[actix_web::test]
    async fn request_then_confirm_changes_password() {
        let mut fixture = fixture();
        let user_id = register(&fixture, "a@x.io", "pw1-original");

        fixture.service.request_reset("A@x.io").expect("request");
        let delivered = fixture.deliveries.recv().await.expect("delivery");
        assert_eq!(delivered.email, "a@x.io");
        assert_eq!(delivered.expires_in_minutes, 60);
        assert!(
            delivered
                .reset_link
                .starts_with("http://localhost:3000/reset-password?token=")
        );

        let token = token_from_link(&delivered.reset_link);
        fixture
            .service
            .confirm_reset(&token, "pw2-replacement")
            .expect("confirm");

        let user = fixture.db.user_by_id(user_id).expect("read").expect("user");
        assert!(
            fixture
                .hasher
                .verify("pw2-replacement", &user.password_digest)
                .expect("verify")
        );
        assert!(
            !fixture
                .hasher
                .verify("pw1-original", &user.password_digest)
                .expect("verify")
        );
    }

    #[actix_web::test]
    async fn stored_row_holds_digest_not_token() {
        let mut fixture = fixture();
        register(&fixture, "a@x.io", "pw1-original");
        fixture.service.request_reset("a@x.io").expect("request");
        let token = token_from_link(&fixture.deliveries.recv().await.expect("delivery").reset_link);

        assert!(
            fixture
                .db
                .reset_token_by_digest(&token)
                .expect("lookup")
                .is_none()
        );
        let row = fixture
            .db
            .reset_token_by_digest(&digest_reset_token(&token))
            .expect("lookup")
            .expect("row");
        assert!(!row.used);
        assert_eq!(row.expires_at - row.created_at, Duration::hours(1));
    }

    #[actix_web::test]
    async fn unknown_email_succeeds_without_delivery() {
        let mut fixture = fixture();
        register(&fixture, "a@x.io", "pw1-original");

        fixture.service.request_reset("nobody@x.io").expect("request");
        tokio::task::yield_now().await;
        assert!(fixture.deliveries.try_recv().is_err());
    }

    #[actix_web::test]
    async fn malformed_email_is_treated_as_unregistered() {
        let mut fixture = fixture();
        register(&fixture, "a@x.io", "pw1-original");

        for email in ["not-an-email", "", "a@x.io@"] {
            fixture.service.request_reset(email).expect("request");
        }
        tokio::task::yield_now().await;
        assert!(fixture.deliveries.try_recv().is_err());
    }

    #[actix_web::test]
    async fn token_is_single_use() {
        let mut fixture = fixture();
        register(&fixture, "a@x.io", "pw1-original");
        fixture.service.request_reset("a@x.io").expect("request");
        let token = token_from_link(&fixture.deliveries.recv().await.expect("delivery").reset_link);

        fixture
            .service
            .confirm_reset(&token, "pw2-replacement")
            .expect("first");
        assert!(matches!(
            fixture.service.confirm_reset(&token, "pw3-replacement"),
            Err(ResetError::InvalidToken)
        ));
    }

    #[actix_web::test]
    async fn weak_password_does_not_consume_token() {
        let mut fixture = fixture();
        register(&fixture, "a@x.io", "pw1-original");
        fixture.service.request_reset("a@x.io").expect("request");
        let token = token_from_link(&fixture.deliveries.recv().await.expect("delivery").reset_link);

        assert!(matches!(
            fixture.service.confirm_reset(&token, ""),
            Err(ResetError::Validation(_))
        ));
        fixture
            .service
            .confirm_reset(&token, "long-enough-now")
            .expect("confirm");
    }

    #[actix_web::test]
    async fn expired_token_is_rejected() {
        let fixture = fixture();
        let user_id = register(&fixture, "a@x.io", "pw1-original");
        let issued = generate_reset_token();
        let created_at = Utc::now() - Duration::hours(2);
        fixture
            .db
            .insert_reset_token(NewResetToken {
                user_id,
                token_digest: issued.digest,
                created_at,
                expires_at: created_at + Duration::hours(1),
            })
            .expect("seed");

        assert!(matches!(
            fixture.service.confirm_reset(&issued.token, "pw2-replacement"),
            Err(ResetError::InvalidToken)
        ));
    }

    #[actix_web::test]
    async fn malformed_and_unknown_tokens_look_the_same() {
        let fixture = fixture();
        let unknown = generate_reset_token().token;
        for token in ["", "garbage", unknown.as_str()] {
            let err = fixture
                .service
                .confirm_reset(token, "pw2-replacement")
                .expect_err("rejected");
            assert!(matches!(err, ResetError::InvalidToken));
            assert_eq!(err.to_string(), INVALID_RESET_TOKEN_MESSAGE);
        }
    }

    #[actix_web::test]
    async fn delivery_failure_is_not_reported_to_caller() {
        let db = Arc::new(Database::in_memory());
        let hasher = Arc::new(Argon2Hasher::new(&test_params()).expect("hasher"));
        db.create_user(NewCredential {
            username: "alice".to_string(),
            email: "a@x.io".to_string(),
            password_digest: hasher.hash("pw1-original").expect("hash"),
        })
        .expect("user");
        let service = PasswordResetService::new(
            db.clone(),
            db.clone(),
            hasher,
            Arc::new(FailingNotifier),
            &ValidatedPasswordResetConfig {
                token_ttl: std::time::Duration::from_secs(3600),
                frontend_url: "http://localhost:3000".to_string(),
            },
        )
        .expect("service");

        assert!(service.request_reset("a@x.io").is_ok());
    }

    struct BrokenSnapshots;

    impl SnapshotStore for BrokenSnapshots {
        fn load(&self) -> Result<BlogData, StoreError> {
            Ok(BlogData::default())
        }

        fn save(&self, _data: &BlogData) -> Result<(), StoreError> {
            Err(StoreError::FileError("disk full".to_string()))
        }
    }

    fn service_over(db: Arc<Database>, notifier: Arc<dyn ResetNotifier>) -> PasswordResetService {
        let hasher = Arc::new(Argon2Hasher::new(&test_params()).expect("hasher"));
        PasswordResetService::new(
            db.clone(),
            db,
            hasher,
            notifier,
            &ValidatedPasswordResetConfig {
                token_ttl: std::time::Duration::from_secs(3600),
                frontend_url: "http://localhost:3000".to_string(),
            },
        )
        .expect("service")
    }

    #[actix_web::test]
    async fn unmatched_request_reports_persistence_failure() {
        let db = Arc::new(Database::open(Arc::new(BrokenSnapshots)).expect("open"));
        let service = service_over(db, Arc::new(FailingNotifier));
        assert!(matches!(
            service.request_reset("nobody@x.io"),
            Err(ResetError::Internal(_))
        ));
    }

    fn median(mut samples: Vec<u128>) -> u128 {
        samples.sort_unstable();
        samples[samples.len() / 2]
    }

    #[actix_web::test]
    async fn known_and_unknown_requests_cost_the_same() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshots = FileSnapshotStore::new(dir.path().join("blog.yaml")).expect("snapshots");
        let db = Arc::new(Database::open(Arc::new(snapshots)).expect("open"));
        db.create_user(NewCredential {
            username: "alice".to_string(),
            email: "a@x.io".to_string(),
            password_digest: "digest".to_string(),
        })
        .expect("user");
        let (sender, _deliveries) = mpsc::unbounded_channel();
        let service = service_over(db, Arc::new(ChannelNotifier { sender }));

        service.request_reset("a@x.io").expect("warm up");
        service.request_reset("nobody@x.io").expect("warm up");

        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for _ in 0..25 {
            let started = Instant::now();
            service.request_reset("a@x.io").expect("known");
            known.push(started.elapsed().as_micros());

            let started = Instant::now();
            service.request_reset("nobody@x.io").expect("unknown");
            unknown.push(started.elapsed().as_micros());
        }

        let (known, unknown) = (median(known), median(unknown));
        assert!(
            known <= unknown * 3 + 500 && unknown <= known * 3 + 500,
            "known={}us unknown={}us",
            known,
            unknown
        );
    }
}
