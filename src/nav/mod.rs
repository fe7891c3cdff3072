// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Host-facing traits and the navigation state machine.

pub mod controller;
pub mod host;

pub use controller::{
    NavConfig, NavError, NavOutcome, NavPhase, NavigationController, StepFailure,
};
pub use host::{
    BranchDirection, BranchSwitch, NotificationSink, PathObserver, StatusEvent, StatusKind,
};

#[cfg(test)]
mod tests;
