// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Collaborator interfaces onto the host chat interface.
//!
//! Implementations live outside this crate (DOM adapters, test fakes). The
//! engine only assumes the host renders one linear path and exposes step-wise
//! previous/next branch controls per parent message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{NodeId, ObservedMessage};

/// Direction of one step-wise branch switch at a parent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchDirection {
    Forward,
    Backward,
}

/// Snapshot source for the currently rendered path.
#[async_trait]
pub trait PathObserver: Send + Sync {
    /// The visible path, root to leaf. Empty when nothing is rendered yet.
    async fn visible_path(&self) -> Vec<ObservedMessage>;
}

/// The host's step-wise branch controls at one parent message.
#[async_trait]
pub trait BranchSwitch: Send + Sync {
    /// Number of alternative branches under `parent_id`, or `None` when the
    /// expected controls are absent.
    async fn branch_count(&self, parent_id: &NodeId) -> Option<u32>;

    /// 1-based index of the branch currently rendered under `parent_id`.
    async fn current_branch_index(&self, parent_id: &NodeId) -> Option<u32>;

    /// Issues one advance action. `true` means the host accepted the action
    /// and has begun updating; the caller still waits out the settle delay.
    async fn advance(&self, parent_id: &NodeId, direction: BranchDirection) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Error,
}

/// A user-facing status report emitted at the start, each retry, and the
/// terminal outcome of a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }
}

/// Sink for user-facing status events.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: StatusEvent);
}
