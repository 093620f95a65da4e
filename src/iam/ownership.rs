// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::store::UserId;

/// Implemented by anything with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

impl Owned for crate::store::Post {
    fn owner_id(&self) -> UserId {
        self.author_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotOwner {
    pub subject: UserId,
    pub owner: UserId,
}

impl std::fmt::Display for NotOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user {} does not own a resource of user {}", self.subject, self.owner)
    }
}

impl std::error::Error for NotOwner {}

pub fn ensure_owner<R: Owned>(subject: UserId, resource: &R) -> Result<(), NotOwner> {
    let owner = resource.owner_id();
    if owner == subject {
        Ok(())
    } else {
        Err(NotOwner { subject, owner })
    }
}
