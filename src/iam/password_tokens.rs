// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// Random bytes behind every reset token.
pub const RESET_TOKEN_BYTES: usize = 32;

/// A freshly minted reset token: the value mailed to the user and the digest kept at rest.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub token: String,
    pub digest: String,
}

pub fn generate_reset_token() -> IssuedResetToken {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);
    let digest = digest_reset_token(&token);
    IssuedResetToken { token, digest }
}

pub fn digest_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check run before touching the store.
pub fn is_well_formed(token: &str) -> bool {
    URL_SAFE_NO_PAD
        .decode(token)
        .map(|bytes| bytes.len() == RESET_TOKEN_BYTES)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_url_safe_and_unique() {
        let first = generate_reset_token();
        let second = generate_reset_token();
        assert_ne!(first.token, second.token);
        assert_eq!(first.token.len(), 43);
        assert!(
            first
                .token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert!(is_well_formed(&first.token));
    }

    #[test]
    fn digest_is_stable_and_hides_token() {
        let issued = generate_reset_token();
        assert_eq!(issued.digest, digest_reset_token(&issued.token));
        assert_eq!(issued.digest.len(), 64);
        assert!(!issued.digest.contains(&issued.token));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"a".repeat(44)));
        assert!(!is_well_formed(&format!("{}=", "A".repeat(42))));
        assert!(!is_well_formed("not base64 at all!"));
    }
}
