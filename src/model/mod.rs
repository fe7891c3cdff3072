// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A session holds one conversation tree rebuilt from host observations, plus
//! presentational view state.

pub mod ids;
pub mod node;
pub mod observed;
pub mod session;
pub mod tree;

pub use ids::{ConversationId, Id, IdError, NodeId};
pub use node::{Node, TEXT_PREVIEW_MAX_CHARS};
pub use observed::{AuthorRole, ObservedMessage};
pub use session::{SessionContext, ViewState, ZOOM_MAX, ZOOM_MIN};
pub use tree::{ConversationTree, ModelError, Upsert};
