// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Multi-step navigation of the host UI towards a target node.
//!
//! One `navigate_to` runs the machine `Resolving -> Stepping -> Verifying ->
//! {Done | Failed}`. Step failures retry the whole operation from scratch
//! with backoff, since the host DOM may have changed underneath us. A newer
//! request supersedes an in-flight one through a generation counter that is
//! checked before every advance action and before every settle wait.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::model::{ModelError, NodeId, SessionContext};
use crate::query::{find_path, fork_point};
use crate::sync::{host_index_divergence, sync_visible_path};

use super::host::{BranchDirection, BranchSwitch, NotificationSink, PathObserver, StatusEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavConfig {
    /// Fixed wait after each advance action before the next observation.
    pub settle_delay: Duration,
    /// Retries beyond the first attempt before giving up.
    pub max_retries: u32,
    /// Backoff before retry `n` is `backoff_base * n`.
    pub backoff_base: Duration,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(300),
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPhase {
    Idle,
    Resolving,
    Stepping,
    Verifying,
    Done,
    Failed,
}

/// Successful terminal states of `navigate_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// The target node is rendered by the host.
    Done,
    /// A newer navigation took over; this one stopped without side effects.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    /// Expected branch controls are absent at this parent.
    MissingControls { parent_id: NodeId },
    /// The host refused an advance action.
    AdvanceRejected { parent_id: NodeId },
    /// An advance did not move the branch index as expected.
    IndexStuck {
        parent_id: NodeId,
        expected: u32,
        observed: u32,
    },
    /// The host reports fewer branches than the model needs for this step.
    BranchOutOfRange {
        parent_id: NodeId,
        target_index: u32,
        host_count: u32,
    },
    /// All steps completed but the target never became visible.
    TargetNotRendered { target_id: NodeId },
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingControls { parent_id } => {
                write!(f, "branch controls missing at {parent_id}")
            }
            Self::AdvanceRejected { parent_id } => {
                write!(f, "host rejected branch switch at {parent_id}")
            }
            Self::IndexStuck {
                parent_id,
                expected,
                observed,
            } => write!(
                f,
                "branch index at {parent_id} did not settle (expected {expected}, observed {observed})"
            ),
            Self::BranchOutOfRange {
                parent_id,
                target_index,
                host_count,
            } => write!(
                f,
                "host shows {host_count} branches at {parent_id}, need index {target_index}"
            ),
            Self::TargetNotRendered { target_id } => {
                write!(f, "target {target_id} never became visible")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    /// Target or current node unresolvable in the model.
    NotFound { node_id: NodeId },
    /// The observation violated a model invariant.
    Invariant(ModelError),
    /// One attempt failed; recovered by the retry loop unless exhausted.
    StepFailed(StepFailure),
    /// Terminal: the retry budget ran out.
    MaxRetriesExceeded { attempts: u32, last: StepFailure },
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { node_id } => write!(f, "node {node_id} not found in the tree"),
            Self::Invariant(err) => write!(f, "model invariant violated: {err}"),
            Self::StepFailed(failure) => write!(f, "navigation step failed: {failure}"),
            Self::MaxRetriesExceeded { attempts, last } => {
                write!(f, "navigation gave up after {attempts} attempts: {last}")
            }
        }
    }
}

impl std::error::Error for NavError {}

impl From<ModelError> for NavError {
    fn from(err: ModelError) -> Self {
        Self::Invariant(err)
    }
}

enum AttemptOutcome {
    Done,
    Superseded,
}

enum StepOutcome {
    Advanced,
    Superseded,
}

/// Drives the host UI from its current position to a target node.
pub struct NavigationController {
    session: Arc<Mutex<SessionContext>>,
    observer: Arc<dyn PathObserver>,
    switch: Arc<dyn BranchSwitch>,
    notifications: Arc<dyn NotificationSink>,
    config: NavConfig,
    generation: AtomicU64,
    phase: std::sync::Mutex<NavPhase>,
}

impl NavigationController {
    pub fn new(
        session: Arc<Mutex<SessionContext>>,
        observer: Arc<dyn PathObserver>,
        switch: Arc<dyn BranchSwitch>,
        notifications: Arc<dyn NotificationSink>,
        config: NavConfig,
    ) -> Self {
        Self {
            session,
            observer,
            switch,
            notifications,
            config,
            generation: AtomicU64::new(0),
            phase: std::sync::Mutex::new(NavPhase::Idle),
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Phase of the most recent navigation.
    pub fn phase(&self) -> NavPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: NavPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    fn superseded(&self, my_generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != my_generation
    }

    /// Navigates the host UI to `target_id`.
    ///
    /// Re-synchronizes from the host before resolving, then switches branches
    /// step by step along the route below the fork point. Only one navigation
    /// is active at a time: calling this again supersedes the in-flight one.
    pub async fn navigate_to(&self, target_id: &NodeId) -> Result<NavOutcome, NavError> {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.notifications
            .notify(StatusEvent::info(format!("navigating to {target_id}")));

        let mut last_failure: Option<StepFailure> = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                self.notifications.notify(StatusEvent::info(format!(
                    "retrying navigation to {target_id} (attempt {} of {})",
                    attempt + 1,
                    self.config.max_retries + 1
                )));
                if self.superseded(my_generation) {
                    self.set_phase(NavPhase::Idle);
                    return Ok(NavOutcome::Superseded);
                }
                tokio::time::sleep(self.config.backoff_base * attempt).await;
            }

            match self.attempt(target_id, my_generation).await {
                Ok(AttemptOutcome::Done) => {
                    // Branch target confirmed reachable; the fork origin marker
                    // has served its purpose.
                    self.session.lock().await.tree_mut().clear_branch_start();
                    self.set_phase(NavPhase::Done);
                    self.notifications
                        .notify(StatusEvent::info(format!("reached {target_id}")));
                    return Ok(NavOutcome::Done);
                }
                Ok(AttemptOutcome::Superseded) => {
                    self.set_phase(NavPhase::Idle);
                    return Ok(NavOutcome::Superseded);
                }
                Err(NavError::StepFailed(failure)) => {
                    warn!(target_id = %target_id, attempt, %failure, "navigation attempt failed");
                    last_failure = Some(failure);
                }
                Err(err) => {
                    self.set_phase(NavPhase::Failed);
                    self.notifications.notify(StatusEvent::error(format!(
                        "navigation to {target_id} failed: {err}"
                    )));
                    return Err(err);
                }
            }
        }

        let last = last_failure.unwrap_or(StepFailure::TargetNotRendered {
            target_id: target_id.clone(),
        });
        let err = NavError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last,
        };
        self.set_phase(NavPhase::Failed);
        self.notifications.notify(StatusEvent::error(format!(
            "navigation to {target_id} failed: {err}"
        )));
        Err(err)
    }

    async fn attempt(
        &self,
        target_id: &NodeId,
        my_generation: u64,
    ) -> Result<AttemptOutcome, NavError> {
        self.set_phase(NavPhase::Resolving);

        let observed = self.observer.visible_path().await;
        let (current_path, target_path) = {
            let mut session = self.session.lock().await;
            let tree = session.tree_mut();
            sync_visible_path(tree, &observed)?;

            let Some(leaf_id) = tree.active_leaf_id().cloned() else {
                return Err(NavError::NotFound {
                    node_id: target_id.clone(),
                });
            };
            let current_path = find_path(tree, &leaf_id).ok_or(NavError::NotFound {
                node_id: leaf_id.clone(),
            })?;
            let target_path = find_path(tree, target_id).ok_or_else(|| NavError::NotFound {
                node_id: target_id.clone(),
            })?;
            (current_path, target_path)
        };

        // Every node on the visible path is rendered.
        if current_path.iter().any(|id| id == target_id) {
            return Ok(AttemptOutcome::Done);
        }

        let Some(fork) = fork_point(&current_path, &target_path) else {
            // Both paths are root-anchored; no shared prefix means the host
            // contract is broken.
            return Err(NavError::NotFound {
                node_id: target_id.clone(),
            });
        };
        debug!(
            target_id = %target_id,
            fork = %fork.fork_id(),
            steps = fork.suffix_b().len(),
            "resolved navigation route"
        );

        let mut parent_id = fork.fork_id().clone();
        for step_id in fork.suffix_b() {
            self.set_phase(NavPhase::Stepping);
            if let StepOutcome::Superseded =
                self.step_to_branch(&parent_id, step_id, my_generation).await?
            {
                return Ok(AttemptOutcome::Superseded);
            }

            // After each batch of advances, re-observe: the host may already
            // render the target, in which case the remaining steps are moot.
            self.set_phase(NavPhase::Verifying);
            let observed = self.observer.visible_path().await;
            let mut session = self.session.lock().await;
            sync_visible_path(session.tree_mut(), &observed)?;
            if session.tree().active_branch().iter().any(|id| id == target_id) {
                return Ok(AttemptOutcome::Done);
            }
            drop(session);

            parent_id = step_id.clone();
        }

        Err(NavError::StepFailed(StepFailure::TargetNotRendered {
            target_id: target_id.clone(),
        }))
    }

    /// Switches the host to the branch holding `child_id` under `parent_id`.
    async fn step_to_branch(
        &self,
        parent_id: &NodeId,
        child_id: &NodeId,
        my_generation: u64,
    ) -> Result<StepOutcome, NavError> {
        let (target_index, child_count) = {
            let session = self.session.lock().await;
            let tree = session.tree();
            let target_index =
                tree.branch_index(parent_id, child_id)
                    .ok_or(NavError::NotFound {
                        node_id: child_id.clone(),
                    })?;
            (target_index, tree.child_count(parent_id))
        };

        if child_count <= 1 {
            // Sole known branch; the host renders it without controls.
            return Ok(StepOutcome::Advanced);
        }

        let Some(host_count) = self.switch.branch_count(parent_id).await else {
            return Err(NavError::StepFailed(StepFailure::MissingControls {
                parent_id: parent_id.clone(),
            }));
        };
        let Some(mut current_index) = self.switch.current_branch_index(parent_id).await else {
            return Err(NavError::StepFailed(StepFailure::MissingControls {
                parent_id: parent_id.clone(),
            }));
        };
        if host_count < target_index || current_index == 0 || current_index > host_count {
            return Err(NavError::StepFailed(StepFailure::BranchOutOfRange {
                parent_id: parent_id.clone(),
                target_index,
                host_count,
            }));
        }
        {
            // Trace-only: the host index is trusted for navigation, the model
            // keeps its discovery order (reconciliation is an open question).
            let session = self.session.lock().await;
            if let Some(model_child_id) = visible_child_of(&session, parent_id) {
                host_index_divergence(session.tree(), parent_id, &model_child_id, current_index);
            }
        }

        while current_index != target_index {
            if self.superseded(my_generation) {
                return Ok(StepOutcome::Superseded);
            }

            let direction = if target_index > current_index {
                BranchDirection::Forward
            } else {
                BranchDirection::Backward
            };
            if !self.switch.advance(parent_id, direction).await {
                return Err(NavError::StepFailed(StepFailure::AdvanceRejected {
                    parent_id: parent_id.clone(),
                }));
            }

            if self.superseded(my_generation) {
                return Ok(StepOutcome::Superseded);
            }
            tokio::time::sleep(self.config.settle_delay).await;

            let expected = match direction {
                BranchDirection::Forward => current_index + 1,
                BranchDirection::Backward => current_index - 1,
            };
            let Some(observed_index) = self.switch.current_branch_index(parent_id).await else {
                return Err(NavError::StepFailed(StepFailure::MissingControls {
                    parent_id: parent_id.clone(),
                }));
            };
            if observed_index != expected {
                return Err(NavError::StepFailed(StepFailure::IndexStuck {
                    parent_id: parent_id.clone(),
                    expected,
                    observed: observed_index,
                }));
            }
            current_index = observed_index;
        }

        Ok(StepOutcome::Advanced)
    }
}

/// The child of `parent_id` on the active branch, if the branch runs through
/// this parent.
fn visible_child_of(session: &SessionContext, parent_id: &NodeId) -> Option<NodeId> {
    let branch = session.tree().active_branch();
    let position = branch.iter().position(|id| id == parent_id)?;
    branch.get(position + 1).cloned()
}
