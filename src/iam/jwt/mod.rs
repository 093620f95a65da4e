// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod service;
mod types;

#[cfg(test)]
pub(crate) use service::test_jwt_config;
pub use service::{SIGNING_ALGORITHM, TokenService};
pub use types::{Claims, JwtError, TokenKind, TokenPair};
