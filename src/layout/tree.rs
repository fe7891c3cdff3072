// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ConversationTree, NodeId};

/// A node's drawing position. Transient: recomputed every render, never
/// stored on the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    min_spacing: f64,
    vertical_spacing: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            min_spacing: 48.0,
            vertical_spacing: 72.0,
        }
    }
}

impl LayoutParams {
    pub fn new(min_spacing: f64, vertical_spacing: f64) -> Self {
        Self {
            min_spacing,
            vertical_spacing,
        }
    }

    pub fn min_spacing(&self) -> f64 {
        self.min_spacing
    }

    pub fn vertical_spacing(&self) -> f64 {
        self.vertical_spacing
    }
}

/// Horizontal room a node's subtree needs: `min_spacing` for a leaf, else the
/// sum of the children's widths, floored at `min_spacing`.
pub fn subtree_width(tree: &ConversationTree, node_id: &NodeId, params: &LayoutParams) -> f64 {
    let children = tree.node(node_id).map_or(&[][..], |node| node.children());
    if children.is_empty() {
        return params.min_spacing();
    }
    let total: f64 = children
        .iter()
        .map(|child_id| subtree_width(tree, child_id, params))
        .sum();
    total.max(params.min_spacing())
}

/// Pure, deterministic layout: identical tree shape and root position always
/// yield identical coordinates.
///
/// Each child is centered beneath its parent in left-to-right (discovery)
/// order using cumulative offsets of the preceding siblings' widths, one
/// `vertical_spacing` per generation.
pub fn layout_tree(
    tree: &ConversationTree,
    root_position: Point,
    params: &LayoutParams,
) -> BTreeMap<NodeId, Point> {
    let mut placements = BTreeMap::new();
    if let Some(root_id) = tree.root_id() {
        position_nodes(tree, root_id, root_position, params, &mut placements);
    }
    placements
}

fn position_nodes(
    tree: &ConversationTree,
    node_id: &NodeId,
    position: Point,
    params: &LayoutParams,
    placements: &mut BTreeMap<NodeId, Point>,
) {
    placements.insert(node_id.clone(), position);

    let children = tree.node(node_id).map_or(&[][..], |node| node.children());
    if children.is_empty() {
        return;
    }

    let total_width: f64 = children
        .iter()
        .map(|child_id| subtree_width(tree, child_id, params))
        .sum();

    let child_y = position.y() + params.vertical_spacing();
    let mut offset = -total_width / 2.0;
    for child_id in children {
        let width = subtree_width(tree, child_id, params);
        let child_x = position.x() + offset + width / 2.0;
        position_nodes(tree, child_id, Point::new(child_x, child_y), params, placements);
        offset += width;
    }
}
