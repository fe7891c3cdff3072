// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Snapshot types for what the host interface currently renders.
//!
//! An observation is an ordered root-to-leaf sequence of messages. Ids are
//! raw host tokens here and are validated at the sync boundary.

use serde::{Deserialize, Serialize};

/// Who authored a rendered message, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    User,
    Assistant,
    System,
    Tool,
}

/// One rendered message in the currently visible path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedMessage {
    pub id: String,
    pub text: String,
    pub author_role: AuthorRole,
}

impl ObservedMessage {
    pub fn new(id: impl Into<String>, text: impl Into<String>, author_role: AuthorRole) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author_role,
        }
    }
}
