// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Larissa-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Larissa and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, Semaphore};

use crate::model::{AuthorRole, ConversationId, NodeId, ObservedMessage, SessionContext};
use crate::sync::{mark_branch_start, sync_visible_path};

use super::controller::{NavConfig, NavError, NavOutcome, NavPhase, NavigationController, StepFailure};
use super::host::{BranchDirection, BranchSwitch, NotificationSink, PathObserver, StatusEvent, StatusKind};

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

/// The host's own little branching world: full tree plus a selected branch
/// per parent. The visible path is derived by walking selections from root.
#[derive(Debug, Default)]
struct HostTree {
    root: Option<NodeId>,
    children: BTreeMap<NodeId, Vec<NodeId>>,
    selected: BTreeMap<NodeId, usize>,
}

impl HostTree {
    fn visible(&self) -> Vec<ObservedMessage> {
        let mut path = Vec::new();
        let Some(mut current) = self.root.clone() else {
            return path;
        };
        loop {
            path.push(ObservedMessage::new(
                current.as_str(),
                format!("text of {current}"),
                AuthorRole::Assistant,
            ));
            let Some(children) = self.children.get(&current).filter(|c| !c.is_empty()) else {
                break;
            };
            let index = self
                .selected
                .get(&current)
                .copied()
                .unwrap_or(0)
                .min(children.len() - 1);
            current = children[index].clone();
        }
        path
    }
}

#[derive(Default)]
struct FakeHost {
    tree: std::sync::Mutex<HostTree>,
    advances: std::sync::Mutex<Vec<(NodeId, BranchDirection)>>,
    reject_next_advances: AtomicUsize,
    controls_broken: AtomicBool,
    /// When set, `advance` signals on the channel and waits for a gate permit
    /// before doing anything.
    gate: Option<(Arc<Semaphore>, mpsc::UnboundedSender<()>)>,
}

impl FakeHost {
    /// root -> n1 -> {n2, n3}; n2 currently selected.
    fn branching_fixture() -> Self {
        let mut tree = HostTree::default();
        tree.root = Some(nid("root"));
        tree.children.insert(nid("root"), vec![nid("n1")]);
        tree.children.insert(nid("n1"), vec![nid("n2"), nid("n3")]);
        tree.selected.insert(nid("n1"), 0);
        Self {
            tree: std::sync::Mutex::new(tree),
            ..Self::default()
        }
    }

    fn visible_now(&self) -> Vec<ObservedMessage> {
        self.tree.lock().expect("host tree lock").visible()
    }

    fn select(&self, parent_id: &NodeId, index: usize) {
        self.tree
            .lock()
            .expect("host tree lock")
            .selected
            .insert(parent_id.clone(), index);
    }

    fn advance_count(&self) -> usize {
        self.advances.lock().expect("advances lock").len()
    }

    fn advance_log(&self) -> Vec<(NodeId, BranchDirection)> {
        self.advances.lock().expect("advances lock").clone()
    }
}

#[async_trait]
impl PathObserver for FakeHost {
    async fn visible_path(&self) -> Vec<ObservedMessage> {
        self.visible_now()
    }
}

#[async_trait]
impl BranchSwitch for FakeHost {
    async fn branch_count(&self, parent_id: &NodeId) -> Option<u32> {
        if self.controls_broken.load(Ordering::SeqCst) {
            return None;
        }
        let tree = self.tree.lock().expect("host tree lock");
        let children = tree.children.get(parent_id)?;
        (!children.is_empty()).then_some(children.len() as u32)
    }

    async fn current_branch_index(&self, parent_id: &NodeId) -> Option<u32> {
        if self.controls_broken.load(Ordering::SeqCst) {
            return None;
        }
        let tree = self.tree.lock().expect("host tree lock");
        let children = tree.children.get(parent_id)?;
        if children.is_empty() {
            return None;
        }
        Some(tree.selected.get(parent_id).copied().unwrap_or(0) as u32 + 1)
    }

    async fn advance(&self, parent_id: &NodeId, direction: BranchDirection) -> bool {
        if let Some((gate, started)) = &self.gate {
            started.send(()).expect("gate channel open");
            let permit = gate.acquire().await.expect("gate never closed");
            permit.forget();
        }

        self.advances
            .lock()
            .expect("advances lock")
            .push((parent_id.clone(), direction));

        let pending_rejects = self.reject_next_advances.load(Ordering::SeqCst);
        if pending_rejects > 0 {
            self.reject_next_advances
                .store(pending_rejects - 1, Ordering::SeqCst);
            return false;
        }

        let mut tree = self.tree.lock().expect("host tree lock");
        let len = tree.children.get(parent_id).map(Vec::len).unwrap_or(0);
        let index = tree.selected.get(parent_id).copied().unwrap_or(0);
        let next = match direction {
            BranchDirection::Forward => index + 1,
            BranchDirection::Backward => {
                let Some(prev) = index.checked_sub(1) else {
                    return false;
                };
                prev
            }
        };
        if next >= len {
            return false;
        }
        tree.selected.insert(parent_id.clone(), next);
        true
    }
}

#[derive(Default)]
struct RecordingSink {
    events: std::sync::Mutex<Vec<StatusEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: StatusEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

fn test_config(max_retries: u32) -> NavConfig {
    NavConfig {
        settle_delay: Duration::ZERO,
        max_retries,
        backoff_base: Duration::ZERO,
    }
}

struct Fixture {
    controller: Arc<NavigationController>,
    host: Arc<FakeHost>,
    sink: Arc<RecordingSink>,
    session: Arc<Mutex<SessionContext>>,
}

async fn fixture_with(host: FakeHost, max_retries: u32) -> Fixture {
    let host = Arc::new(host);
    let sink = Arc::new(RecordingSink::default());
    let session = Arc::new(Mutex::new(SessionContext::new(
        ConversationId::new("c-test").expect("conversation id"),
    )));
    let controller = Arc::new(NavigationController::new(
        session.clone(),
        host.clone() as Arc<dyn PathObserver>,
        host.clone() as Arc<dyn BranchSwitch>,
        sink.clone() as Arc<dyn NotificationSink>,
        test_config(max_retries),
    ));
    Fixture {
        controller,
        host,
        sink,
        session,
    }
}

/// Teaches the model both branches under n1 by flipping the host selection
/// and observing, then restores the original selection.
async fn teach_both_branches(fixture: &Fixture) {
    let mut session = fixture.session.lock().await;
    sync_visible_path(session.tree_mut(), &fixture.host.visible_now()).expect("sync n2");
    fixture.host.select(&nid("n1"), 1);
    sync_visible_path(session.tree_mut(), &fixture.host.visible_now()).expect("sync n3");
    fixture.host.select(&nid("n1"), 0);
    sync_visible_path(session.tree_mut(), &fixture.host.visible_now()).expect("sync back");
}

#[tokio::test]
async fn navigating_to_a_sibling_switches_one_branch_forward() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 2).await;
    teach_both_branches(&fixture).await;

    assert_eq!(fixture.host.branch_count(&nid("n1")).await, Some(2));

    let outcome = fixture.controller.navigate_to(&nid("n3")).await;
    assert_eq!(outcome, Ok(NavOutcome::Done));
    assert_eq!(fixture.controller.phase(), NavPhase::Done);
    assert_eq!(
        fixture.host.advance_log(),
        vec![(nid("n1"), BranchDirection::Forward)]
    );

    let session = fixture.session.lock().await;
    assert_eq!(session.tree().active_leaf_id(), Some(&nid("n3")));
}

#[tokio::test]
async fn navigating_back_switches_backward() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 2).await;
    teach_both_branches(&fixture).await;

    fixture.host.select(&nid("n1"), 1);
    let outcome = fixture.controller.navigate_to(&nid("n2")).await;
    assert_eq!(outcome, Ok(NavOutcome::Done));
    assert_eq!(
        fixture.host.advance_log(),
        vec![(nid("n1"), BranchDirection::Backward)]
    );
}

#[tokio::test]
async fn target_on_visible_path_finishes_without_advances() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 2).await;
    teach_both_branches(&fixture).await;

    let outcome = fixture.controller.navigate_to(&nid("n1")).await;
    assert_eq!(outcome, Ok(NavOutcome::Done));
    assert_eq!(fixture.host.advance_count(), 0);
}

#[tokio::test]
async fn transient_advance_failures_are_retried_to_success() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 2).await;
    teach_both_branches(&fixture).await;
    fixture.host.reject_next_advances.store(2, Ordering::SeqCst);

    let outcome = fixture.controller.navigate_to(&nid("n3")).await;
    assert_eq!(outcome, Ok(NavOutcome::Done));
    // Two rejected attempts plus the one that landed.
    assert_eq!(fixture.host.advance_count(), 3);
}

#[tokio::test]
async fn exhausted_retry_budget_reports_max_retries_exceeded() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 1).await;
    teach_both_branches(&fixture).await;
    fixture.host.reject_next_advances.store(2, Ordering::SeqCst);

    let outcome = fixture.controller.navigate_to(&nid("n3")).await;
    assert_eq!(
        outcome,
        Err(NavError::MaxRetriesExceeded {
            attempts: 2,
            last: StepFailure::AdvanceRejected { parent_id: nid("n1") },
        })
    );
    assert_eq!(fixture.controller.phase(), NavPhase::Failed);

    let last = fixture.sink.events().pop().expect("terminal event");
    assert_eq!(last.kind, StatusKind::Error);
}

#[tokio::test]
async fn missing_controls_fail_without_moving_the_host() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 0).await;
    teach_both_branches(&fixture).await;
    fixture.host.controls_broken.store(true, Ordering::SeqCst);

    let outcome = fixture.controller.navigate_to(&nid("n3")).await;
    assert_eq!(
        outcome,
        Err(NavError::MaxRetriesExceeded {
            attempts: 1,
            last: StepFailure::MissingControls { parent_id: nid("n1") },
        })
    );
    assert_eq!(fixture.host.advance_count(), 0);
}

#[tokio::test]
async fn unknown_target_reports_not_found_before_any_advance() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 2).await;
    teach_both_branches(&fixture).await;

    let outcome = fixture.controller.navigate_to(&nid("ghost")).await;
    assert_eq!(outcome, Err(NavError::NotFound { node_id: nid("ghost") }));
    assert_eq!(fixture.host.advance_count(), 0);
    assert_eq!(fixture.controller.phase(), NavPhase::Failed);

    let last = fixture.sink.events().pop().expect("terminal event");
    assert_eq!(last.kind, StatusKind::Error);
}

#[tokio::test]
async fn superseding_navigation_stops_the_first_one() {
    let gate = Arc::new(Semaphore::new(0));
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();

    let mut host = FakeHost::branching_fixture();
    host.gate = Some((gate.clone(), started_tx));

    let fixture = fixture_with(host, 2).await;
    teach_both_branches(&fixture).await;

    let controller = fixture.controller.clone();
    let first = tokio::spawn(async move { controller.navigate_to(&nid("n3")).await });

    // Wait until the first navigation is blocked inside its advance action.
    started_rx.recv().await.expect("first advance started");

    // The second request targets an already visible node and completes
    // without touching the gate; it bumps the generation either way.
    let second = fixture.controller.navigate_to(&nid("n2")).await;
    assert_eq!(second, Ok(NavOutcome::Done));

    gate.add_permits(1);
    let first = first.await.expect("first navigation task");
    assert_eq!(first, Ok(NavOutcome::Superseded));
    // The in-flight advance was already issued; nothing further after it.
    assert_eq!(fixture.host.advance_count(), 1);
}

#[tokio::test]
async fn reaching_the_target_clears_the_branch_start_marker() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 2).await;
    teach_both_branches(&fixture).await;

    {
        let mut session = fixture.session.lock().await;
        mark_branch_start(session.tree_mut());
        assert_eq!(session.tree().branch_start_id(), Some(&nid("n2")));
    }

    fixture.controller.navigate_to(&nid("n3")).await.expect("navigate");

    let session = fixture.session.lock().await;
    assert_eq!(session.tree().branch_start_id(), None);
}

#[tokio::test]
async fn successful_navigation_reports_start_and_arrival() {
    let fixture = fixture_with(FakeHost::branching_fixture(), 2).await;
    teach_both_branches(&fixture).await;

    fixture.controller.navigate_to(&nid("n3")).await.expect("navigate");

    let events = fixture.sink.events();
    assert!(events.len() >= 2);
    assert_eq!(events[0], StatusEvent::info("navigating to n3"));
    assert_eq!(events.last(), Some(&StatusEvent::info("reached n3")));
}
