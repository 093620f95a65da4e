// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod jwt;
pub mod middleware;
pub mod notifier;
mod ownership;
mod password;
mod password_reset;
pub mod password_tokens;
mod user_services;

pub use middleware::{AuthRequest, AuthenticatedUser, BearerAuthMiddlewareFactory};
pub use notifier::{
    LogNotifier, NotifierError, ResetNotification, ResetNotifier, WebhookNotifier, build_notifier,
};
pub use ownership::{NotOwner, Owned, ensure_owner};
pub use password::{Argon2Hasher, PasswordError, PasswordHashing};
pub use password_reset::{
    INVALID_RESET_TOKEN_MESSAGE, PasswordResetService, RESET_COMPLETED_MESSAGE,
    RESET_REQUESTED_MESSAGE, ResetError,
};
pub use user_services::{
    DUPLICATE_REGISTRATION_MESSAGE, UserServiceError, UserServiceResult, UserServices,
};
