// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod validation;

pub use validation::{
    MAX_BODY_CHARS, MAX_EMAIL_CHARS, MAX_PASSWORD_CHARS, MAX_TITLE_CHARS, MAX_USERNAME_CHARS,
    MIN_PASSWORD_CHARS, MIN_USERNAME_CHARS, validate_email_field, validate_new_password,
    validate_post_fields, validate_username,
};
