// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Larissa: conversation branch-tree reconstruction and navigation.
//!
//! The host chat interface renders one linear path of a branching conversation
//! at a time. This crate rebuilds the full branch tree from what is observable
//! on screen, resolves routes inside that tree, lays it out for visualization,
//! and drives the host's step-wise branch controls to reach an arbitrary node.

pub mod layout;
pub mod model;
pub mod nav;
pub mod query;
pub mod sync;
