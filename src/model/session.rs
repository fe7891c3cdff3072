// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Session-scoped state for one conversation.
//!
//! A [`SessionContext`] is constructed when a new conversation is detected and
//! discarded when the conversation is left. All components receive it
//! explicitly; nothing here is ambient or global.

use serde::{Deserialize, Serialize};

use super::ids::ConversationId;
use super::tree::ConversationTree;

pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 4.0;

/// Pan offset and zoom scale of the tree visualization.
///
/// Purely presentational; independent of tree correctness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pan_x: f64,
    pan_y: f64,
    zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl ViewState {
    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything the engine holds for one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    conversation_id: ConversationId,
    tree: ConversationTree,
    view: ViewState,
}

impl SessionContext {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            tree: ConversationTree::new(),
            view: ViewState::default(),
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn tree(&self) -> &ConversationTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ConversationTree {
        &mut self.tree
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionContext, ViewState, ZOOM_MAX, ZOOM_MIN};
    use crate::model::ConversationId;

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewState::default();
        view.set_zoom(100.0);
        assert_eq!(view.zoom(), ZOOM_MAX);
        view.set_zoom(0.0);
        assert_eq!(view.zoom(), ZOOM_MIN);
    }

    #[test]
    fn fresh_session_starts_empty() {
        let session =
            SessionContext::new(ConversationId::new("c-1").expect("conversation id"));
        assert!(session.tree().is_empty());
        assert_eq!(session.view().zoom(), 1.0);
        assert_eq!(session.conversation_id().as_str(), "c-1");
    }
}
