// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deterministic 2D layout of the conversation tree.

pub mod tree;

pub use tree::{layout_tree, subtree_width, LayoutParams, Point};
