// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Arena-style storage for the conversation branch tree.
//!
//! Nodes are keyed by stable id and grow append-only within a session: a node
//! is never deleted and its parent never changes once assigned. Children lists
//! grow in discovery order, which doubles as the default branch index.

use std::collections::BTreeMap;
use std::fmt;

use super::ids::{IdError, NodeId};
use super::node::Node;
use super::observed::AuthorRole;

/// The branch tree rebuilt from host observations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationTree {
    nodes: BTreeMap<NodeId, Node>,
    root_id: Option<NodeId>,
    active_branch: Vec<NodeId>,
    branch_start_id: Option<NodeId>,
}

/// Whether an upsert created the node or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Refreshed,
}

impl ConversationTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.root_id.as_ref()
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ordered ids from the root to the deepest currently visible node.
    pub fn active_branch(&self) -> &[NodeId] {
        &self.active_branch
    }

    pub fn active_leaf_id(&self) -> Option<&NodeId> {
        self.active_branch.last()
    }

    pub(crate) fn set_active_branch(&mut self, branch: Vec<NodeId>) {
        self.active_branch = branch;
    }

    /// Node where the most recent regenerate/fork action began, if any.
    pub fn branch_start_id(&self) -> Option<&NodeId> {
        self.branch_start_id.as_ref()
    }

    pub fn set_branch_start(&mut self, node_id: Option<NodeId>) {
        self.branch_start_id = node_id;
    }

    pub fn clear_branch_start(&mut self) {
        self.branch_start_id = None;
    }

    /// Creates the node if absent, or refreshes its preview and role.
    ///
    /// A non-null `parent_id` that differs from the node's assigned parent is
    /// rejected: parents never change within a session. A second distinct
    /// parentless node is likewise rejected, since the tree has exactly one
    /// root.
    pub fn upsert_node(
        &mut self,
        node_id: NodeId,
        parent_id: Option<NodeId>,
        text: &str,
        author_role: AuthorRole,
    ) -> Result<Upsert, ModelError> {
        if let Some(existing) = self.nodes.get_mut(&node_id) {
            if let Some(proposed) = parent_id {
                if existing.parent_id() != Some(&proposed) {
                    return Err(ModelError::ParentChanged {
                        node_id,
                        current: existing.parent_id().cloned(),
                        proposed,
                    });
                }
            }
            existing.refresh(text, author_role);
            return Ok(Upsert::Refreshed);
        }

        match &parent_id {
            None => {
                if let Some(root_id) = &self.root_id {
                    return Err(ModelError::SecondRoot {
                        existing: root_id.clone(),
                        proposed: node_id,
                    });
                }
                self.root_id = Some(node_id.clone());
            }
            Some(parent_id) => {
                if !self.nodes.contains_key(parent_id) {
                    return Err(ModelError::UnknownParent {
                        parent_id: parent_id.clone(),
                    });
                }
            }
        }

        self.nodes
            .insert(node_id.clone(), Node::new(node_id, parent_id, text, author_role));
        Ok(Upsert::Created)
    }

    /// Appends `child_id` to `parent_id`'s children, preserving discovery
    /// order. Idempotent: re-appending an existing child is a no-op.
    ///
    /// Returns `true` when the edge was newly recorded.
    pub fn append_child(&mut self, parent_id: &NodeId, child_id: &NodeId) -> Result<bool, ModelError> {
        let Some(child) = self.nodes.get(child_id) else {
            return Err(ModelError::UnknownChild {
                child_id: child_id.clone(),
            });
        };
        if child.parent_id() != Some(parent_id) {
            return Err(ModelError::EdgeParentMismatch {
                child_id: child_id.clone(),
                parent_id: parent_id.clone(),
                assigned: child.parent_id().cloned(),
            });
        }

        let Some(parent) = self.nodes.get_mut(parent_id) else {
            return Err(ModelError::UnknownParent {
                parent_id: parent_id.clone(),
            });
        };
        if parent.child_index(child_id).is_some() {
            return Ok(false);
        }
        parent.push_child(child_id.clone());
        Ok(true)
    }

    /// 1-based branch index of `child_id` under `parent_id` in discovery
    /// order, matching how the host displays branch positions.
    pub fn branch_index(&self, parent_id: &NodeId, child_id: &NodeId) -> Option<u32> {
        let index = self.nodes.get(parent_id)?.child_index(child_id)?;
        Some(index as u32 + 1)
    }

    pub fn child_count(&self, parent_id: &NodeId) -> u32 {
        self.nodes
            .get(parent_id)
            .map(|node| node.children().len() as u32)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    ParentChanged {
        node_id: NodeId,
        current: Option<NodeId>,
        proposed: NodeId,
    },
    SecondRoot {
        existing: NodeId,
        proposed: NodeId,
    },
    UnknownParent {
        parent_id: NodeId,
    },
    UnknownChild {
        child_id: NodeId,
    },
    EdgeParentMismatch {
        child_id: NodeId,
        parent_id: NodeId,
        assigned: Option<NodeId>,
    },
    InvalidObservedId {
        raw: String,
        reason: IdError,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParentChanged {
                node_id,
                current,
                proposed,
            } => match current {
                Some(current) => write!(
                    f,
                    "node {node_id} already has parent {current}; refusing to reparent to {proposed}"
                ),
                None => write!(
                    f,
                    "node {node_id} is the root; refusing to assign parent {proposed}"
                ),
            },
            Self::SecondRoot { existing, proposed } => {
                write!(f, "tree already has root {existing}; refusing second root {proposed}")
            }
            Self::UnknownParent { parent_id } => write!(f, "parent node not found (id={parent_id})"),
            Self::UnknownChild { child_id } => write!(f, "child node not found (id={child_id})"),
            Self::EdgeParentMismatch {
                child_id,
                parent_id,
                assigned,
            } => match assigned {
                Some(assigned) => write!(
                    f,
                    "child {child_id} belongs to parent {assigned}, not {parent_id}"
                ),
                None => write!(f, "child {child_id} is the root and cannot hang under {parent_id}"),
            },
            Self::InvalidObservedId { raw, reason } => {
                write!(f, "observed message id {raw:?} is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ModelError {}
