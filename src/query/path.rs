// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{ConversationTree, NodeId};

/// First root-to-target path found by depth-first search, children visited in
/// stored (discovery) order. Deterministic because child order is fixed.
/// O(number of nodes); `None` when the target is absent.
pub fn find_path(tree: &ConversationTree, target_id: &NodeId) -> Option<Vec<NodeId>> {
    let root_id = tree.root_id()?.clone();

    // Explicit frame stack; the stack itself is the current path.
    let mut stack: Vec<(NodeId, usize)> = vec![(root_id, 0)];
    while let Some((current, next_child)) = stack.last().cloned() {
        if next_child == 0 && current == *target_id {
            return Some(stack.iter().map(|(id, _)| id.clone()).collect());
        }

        let children = tree.node(&current).map_or(&[][..], |node| node.children());
        if next_child < children.len() {
            if let Some(frame) = stack.last_mut() {
                frame.1 += 1;
            }
            stack.push((children[next_child].clone(), 0));
        } else {
            stack.pop();
        }
    }

    None
}

/// The deepest node common to two root-anchored paths, plus what remains of
/// each path past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkPoint {
    fork_id: NodeId,
    suffix_a: Vec<NodeId>,
    suffix_b: Vec<NodeId>,
}

impl ForkPoint {
    pub fn fork_id(&self) -> &NodeId {
        &self.fork_id
    }

    /// Steps remaining on the first path below the fork.
    pub fn suffix_a(&self) -> &[NodeId] {
        &self.suffix_a
    }

    /// Steps remaining on the second path below the fork.
    pub fn suffix_b(&self) -> &[NodeId] {
        &self.suffix_b
    }
}

/// Last common element over the longest shared prefix of two ordered id
/// lists. When one path is a prefix of the other, the fork point is the last
/// id of the shorter path and that suffix is empty. `None` when the paths
/// share no prefix at all (distinct roots, or an empty path).
pub fn fork_point(path_a: &[NodeId], path_b: &[NodeId]) -> Option<ForkPoint> {
    let shared = path_a
        .iter()
        .zip(path_b.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if shared == 0 {
        return None;
    }

    Some(ForkPoint {
        fork_id: path_a[shared - 1].clone(),
        suffix_a: path_a[shared..].to_vec(),
        suffix_b: path_b[shared..].to_vec(),
    })
}
