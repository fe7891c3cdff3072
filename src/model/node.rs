// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smallvec::SmallVec;
use smol_str::SmolStr;

use super::ids::NodeId;
use super::observed::AuthorRole;

/// Maximum number of characters kept from a message when snapshotting it into
/// a node preview.
pub const TEXT_PREVIEW_MAX_CHARS: usize = 120;

/// A single conversation message in the branch tree.
///
/// `children` is ordered by discovery: the position of a child is its default
/// branch index (1-based when displayed). Positions are not stored here; the
/// layout produces a transient placement map instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    node_id: NodeId,
    parent_id: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    text_preview: SmolStr,
    author_role: AuthorRole,
}

impl Node {
    pub fn new(
        node_id: NodeId,
        parent_id: Option<NodeId>,
        text: &str,
        author_role: AuthorRole,
    ) -> Self {
        Self {
            node_id,
            parent_id,
            children: SmallVec::new(),
            text_preview: preview_of(text),
            author_role,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn text_preview(&self) -> &str {
        &self.text_preview
    }

    pub fn author_role(&self) -> AuthorRole {
        self.author_role
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Zero-based position of `child_id` in discovery order.
    pub fn child_index(&self, child_id: &NodeId) -> Option<usize> {
        self.children.iter().position(|id| id == child_id)
    }

    pub(crate) fn refresh(&mut self, text: &str, author_role: AuthorRole) {
        self.text_preview = preview_of(text);
        self.author_role = author_role;
    }

    pub(crate) fn push_child(&mut self, child_id: NodeId) {
        self.children.push(child_id);
    }
}

fn preview_of(text: &str) -> SmolStr {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(TEXT_PREVIEW_MAX_CHARS) {
        Some((byte_idx, _)) => SmolStr::new(&trimmed[..byte_idx]),
        None => SmolStr::new(trimmed),
    }
}
