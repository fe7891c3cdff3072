// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Reconciliation of an observed linear path into the branch tree.
//!
//! The host reports the currently visible root-to-leaf path whenever its view
//! changes. Sync walks the path pairwise, upserting both ends of each edge and
//! appending newly discovered children, so re-running it on an identical
//! observation is a no-op.

use tracing::{debug, warn};

use crate::model::{ConversationTree, ModelError, NodeId, ObservedMessage, Upsert};

/// What one sync pass changed, in the spirit of a minimal delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    discovered: Vec<NodeId>,
    refreshed: usize,
}

impl SyncReport {
    /// Ids of nodes first seen in this pass, in path order.
    pub fn discovered(&self) -> &[NodeId] {
        &self.discovered
    }

    pub fn refreshed(&self) -> usize {
        self.refreshed
    }

    pub fn grew_tree(&self) -> bool {
        !self.discovered.is_empty()
    }

    fn record(&mut self, node_id: &NodeId, upsert: Upsert) {
        match upsert {
            Upsert::Created => self.discovered.push(node_id.clone()),
            Upsert::Refreshed => self.refreshed += 1,
        }
    }
}

fn node_id_of(message: &ObservedMessage) -> Result<NodeId, ModelError> {
    NodeId::new(message.id.clone()).map_err(|reason| ModelError::InvalidObservedId {
        raw: message.id.clone(),
        reason,
    })
}

/// Reconciles the host's currently visible path into `tree`.
///
/// Sets the active branch to the observed id sequence. An empty observation
/// clears the active branch but leaves the tree content untouched.
pub fn sync_visible_path(
    tree: &mut ConversationTree,
    observed: &[ObservedMessage],
) -> Result<SyncReport, ModelError> {
    let mut report = SyncReport::default();

    let Some(first) = observed.first() else {
        tree.set_active_branch(Vec::new());
        return Ok(report);
    };

    let root_id = node_id_of(first)?;
    let upsert = tree.upsert_node(root_id.clone(), None, &first.text, first.author_role)?;
    report.record(&root_id, upsert);

    let mut branch = Vec::with_capacity(observed.len());
    branch.push(root_id);

    for pair in observed.windows(2) {
        let child = &pair[1];
        let child_id = node_id_of(child)?;
        let parent_id = branch
            .last()
            .cloned()
            .ok_or_else(|| ModelError::UnknownChild {
                child_id: child_id.clone(),
            })?;

        let upsert =
            tree.upsert_node(child_id.clone(), Some(parent_id.clone()), &child.text, child.author_role)?;
        report.record(&child_id, upsert);
        tree.append_child(&parent_id, &child_id)?;
        branch.push(child_id);
    }

    tree.set_active_branch(branch);
    debug!(
        discovered = report.discovered.len(),
        refreshed = report.refreshed,
        depth = observed.len(),
        "synced visible path"
    );
    Ok(report)
}

/// Records the origin of a regenerate/fork action: the deepest node of the
/// path visible just before the fork. Cleared once a navigation confirms the
/// new branch target reachable.
pub fn mark_branch_start(tree: &mut ConversationTree) {
    let leaf = tree.active_leaf_id().cloned();
    if let Some(leaf) = &leaf {
        debug!(node_id = %leaf, "branch start recorded");
    }
    tree.set_branch_start(leaf);
}

/// Divergence between the host-reported branch index and the model's
/// discovery-order index for the same parent.
///
/// The model never reorders children over this; navigation trusts the host's
/// reported current index and only uses the model for target indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchIndexDivergence {
    pub parent_id: NodeId,
    pub model_index: u32,
    pub host_index: u32,
}

/// Compares the host-reported 1-based index of the branch currently rendered
/// under `parent_id` with the model's discovery-order index of `model_child_id`.
pub fn host_index_divergence(
    tree: &ConversationTree,
    parent_id: &NodeId,
    model_child_id: &NodeId,
    host_index: u32,
) -> Option<BranchIndexDivergence> {
    let model_index = tree.branch_index(parent_id, model_child_id)?;
    if model_index == host_index {
        return None;
    }
    warn!(
        parent_id = %parent_id,
        model_index,
        host_index,
        "host branch index diverges from discovery order"
    );
    Some(BranchIndexDivergence {
        parent_id: parent_id.clone(),
        model_index,
        host_index,
    })
}
