//! Deadlock checker orchestration.

use crate::{ActionLog, CheckerConfig, EventBinding, EventRegistry};
use eventlock_core::{ActionSummary, DeadlockReport, Terminator, ValidationChecker, Violation};
use eventlock_graph::DependencyGraph;
use eventlock_types::{EventHandle, NodeId, Submission};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Registration name of the deadlock checker.
pub const CHECKER_NAME: &str = "events_deadlock";

/// Size of the checker's state.
///
/// Nodes and edges are never removed, so these counts only grow over the
/// lifetime of the checker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckerStats {
    /// Events currently live.
    pub live_events: usize,
    /// Graph nodes ever allocated.
    pub nodes: usize,
    /// Wait edges in the graph.
    pub edges: usize,
    /// Nodes claimed by a submitted operation.
    pub actions: usize,
}

/// Detects circular waits between event-gated operations.
///
/// All state sits behind one lock, held for the duration of a single
/// notification. Events cross command lists and threads freely, so there is
/// no finer partitioning to exploit.
pub struct DeadlockChecker {
    config: CheckerConfig,
    terminator: Arc<dyn Terminator>,
    state: Mutex<CheckerState>,
}

#[derive(Debug, Default)]
struct CheckerState {
    registry: EventRegistry,
    graph: DependencyGraph,
    actions: ActionLog,
}

impl DeadlockChecker {
    /// Create a checker that reports violations through `terminator`.
    pub fn new(config: CheckerConfig, terminator: Arc<dyn Terminator>) -> Self {
        let state = CheckerState {
            graph: DependencyGraph::with_capacity(config.node_capacity),
            ..Default::default()
        };
        Self {
            config,
            terminator,
            state: Mutex::new(state),
        }
    }

    /// Current size of the checker's state.
    pub fn stats(&self) -> CheckerStats {
        let state = self.state.lock();
        let graph = state.graph.stats();
        CheckerStats {
            live_events: state.registry.len(),
            nodes: graph.nodes,
            edges: graph.edges,
            actions: state.actions.len(),
        }
    }

    /// Current binding of `event`, or `None` if it is not live.
    pub fn binding(&self, event: EventHandle) -> Option<EventBinding> {
        self.state.lock().registry.binding(event)
    }

    /// Graph node currently associated with `event`.
    pub fn node_of(&self, event: EventHandle) -> Option<NodeId> {
        self.binding(event).and_then(|binding| binding.node())
    }

    /// Check whether the edge `from -> to` exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.state.lock().graph.has_edge(from, to)
    }

    /// Check whether `to` is reachable from `from`.
    pub fn is_reachable(&self, from: NodeId, to: NodeId) -> bool {
        self.state.lock().graph.is_reachable(from, to)
    }

    /// Description of the operation owning `node`.
    pub fn describe(&self, node: NodeId) -> String {
        self.state.lock().actions.describe(node).to_string()
    }

    fn report(&self, result: Result<(), Violation>) -> Result<(), Violation> {
        if let Err(violation) = &result {
            error!(checker = CHECKER_NAME, kind = violation.kind(), "Validation failed");
            self.terminator.terminate(violation);
        }
        result
    }
}

impl CheckerState {
    fn submit(&mut self, submission: &Submission, max_path_len: usize) -> Result<(), Violation> {
        let api = submission.operation.api_name();

        // Validate every handle before allocating anything.
        if let Some(&event) = submission
            .waits
            .iter()
            .find(|&&event| !self.registry.contains(event))
        {
            warn!(api, %event, "Wait on unknown event");
            return Err(Violation::UnknownWaitEvent { api, event });
        }

        let (waiter, claimed) = match submission.signal {
            Some(event) => self
                .registry
                .resolve_as_signal(event, &mut self.graph)
                .ok_or(Violation::UnknownSignalEvent { api, event })?,
            None => (self.graph.new_node(), true),
        };
        // A bound node keeps the operation that first signaled it.
        if claimed {
            self.actions
                .record(waiter, submission.describe(), submission.signal);
        }

        for &event in &submission.waits {
            let signaler = self
                .registry
                .resolve_as_wait(event, &mut self.graph)
                .ok_or(Violation::UnknownWaitEvent { api, event })?;

            if !self.graph.try_insert_edge(signaler, waiter) {
                let report = self.deadlock(submission, event, signaler, waiter, max_path_len);
                return Err(report);
            }
            trace!(%event, %signaler, %waiter, "Recorded wait edge");
        }

        debug!(
            api,
            node = %waiter,
            waits = submission.waits.len(),
            "Recorded submission"
        );
        Ok(())
    }

    fn deadlock(
        &self,
        submission: &Submission,
        event: EventHandle,
        signaler: NodeId,
        waiter: NodeId,
        max_path_len: usize,
    ) -> Violation {
        let (path, truncated) = match self.graph.find_path(waiter, signaler, max_path_len) {
            Some(found) => (found.nodes, found.truncated),
            None => (Vec::new(), false),
        };

        let mut signaler = self.actions.summary(signaler);
        signaler.signal.get_or_insert(event);

        let report = DeadlockReport {
            wait_event: event,
            signaler,
            waiter: ActionSummary {
                node: waiter,
                description: submission.describe(),
                signal: submission.signal,
            },
            path: path
                .into_iter()
                .map(|node| self.actions.summary(node))
                .collect(),
            truncated,
        };
        Violation::Deadlock(Box::new(report))
    }
}

impl ValidationChecker for DeadlockChecker {
    fn name(&self) -> &'static str {
        CHECKER_NAME
    }

    fn on_event_created(&self, event: EventHandle) -> Result<(), Violation> {
        self.state.lock().registry.on_event_created(event);
        trace!(%event, "Event created");
        Ok(())
    }

    fn on_event_destroyed(&self, event: EventHandle) -> Result<(), Violation> {
        if self.state.lock().registry.on_event_destroyed(event).is_none() {
            debug!(%event, "Destroying untracked event");
        }
        Ok(())
    }

    fn on_event_host_reset(&self, event: EventHandle) -> Result<(), Violation> {
        if !self.state.lock().registry.on_event_reset(event) {
            debug!(%event, "Resetting untracked event");
        }
        Ok(())
    }

    fn on_operation_submitted(&self, submission: &Submission) -> Result<(), Violation> {
        let result = self
            .state
            .lock()
            .submit(submission, self.config.max_path_len);
        self.report(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventlock_test_helpers::{barrier, copy, HandleFactory, RecordingTerminator};
    use eventlock_types::{CommandListHandle, Operation};
    use tracing_test::traced_test;

    fn make_checker() -> (DeadlockChecker, Arc<RecordingTerminator>) {
        make_checker_with(CheckerConfig::default())
    }

    fn make_checker_with(config: CheckerConfig) -> (DeadlockChecker, Arc<RecordingTerminator>) {
        let terminator = RecordingTerminator::shared();
        let checker = DeadlockChecker::new(config, terminator.clone());
        (checker, terminator)
    }

    fn create_events(
        checker: &DeadlockChecker,
        handles: &mut HandleFactory,
        n: usize,
    ) -> Vec<EventHandle> {
        let events = handles.events(n);
        for &event in &events {
            checker.on_event_created(event).unwrap();
        }
        events
    }

    /// Three copies chained e0 -> e1 -> e2.
    fn linear_chain(checker: &DeadlockChecker, e: &[EventHandle]) {
        checker.on_operation_submitted(&copy(Some(e[0]), &[])).unwrap();
        checker.on_operation_submitted(&copy(Some(e[1]), &[e[0]])).unwrap();
        checker.on_operation_submitted(&copy(Some(e[2]), &[e[1]])).unwrap();
    }

    #[traced_test]
    #[test]
    fn test_linear_chain_succeeds() {
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 3);

        linear_chain(&checker, &e);

        let n: Vec<NodeId> = e.iter().map(|&event| checker.node_of(event).unwrap()).collect();
        assert!(checker.has_edge(n[0], n[1]));
        assert!(checker.has_edge(n[1], n[2]));
        assert!(!checker.is_reachable(n[2], n[0]));
        assert_eq!(terminator.count(), 0);
        assert_eq!(
            checker.stats(),
            CheckerStats {
                live_events: 3,
                nodes: 3,
                edges: 2,
                actions: 3,
            }
        );
    }

    #[traced_test]
    #[test]
    fn test_three_cycle_detected() {
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 3);
        linear_chain(&checker, &e);

        let result = checker.on_operation_submitted(&copy(Some(e[0]), &[e[2]]));

        let Err(Violation::Deadlock(report)) = result else {
            panic!("expected deadlock, got {result:?}");
        };
        let n0 = checker.node_of(e[0]).unwrap();
        let n2 = checker.node_of(e[2]).unwrap();
        assert_eq!(report.wait_event, e[2]);
        assert_eq!(report.signaler.node, n2);
        assert_eq!(report.waiter.node, n0);
        let path: Vec<NodeId> = report.path.iter().map(|step| step.node).collect();
        assert_eq!(path, vec![n0, checker.node_of(e[1]).unwrap(), n2]);
        assert!(!report.truncated);

        assert_eq!(terminator.count(), 1);
        assert!(!checker.has_edge(n2, n0));
        assert!(logs_contain("Validation failed"));
    }

    #[traced_test]
    #[test]
    fn test_refused_signal_keeps_original_owner() {
        let (checker, _) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 3);
        linear_chain(&checker, &e);

        let n0 = checker.node_of(e[0]).unwrap();
        let op0 = checker.describe(n0);
        let op3 = barrier(Some(e[0]), &[e[2]]);
        let result = checker.on_operation_submitted(&op3);

        let Err(Violation::Deadlock(report)) = result else {
            panic!("expected deadlock, got {result:?}");
        };
        assert_eq!(checker.describe(n0), op0);
        assert_eq!(report.path[0].description, op0);
        assert_eq!(report.waiter.node, n0);
        assert_eq!(report.waiter.description, op3.describe());
        assert_eq!(checker.stats().actions, 3);
    }

    #[traced_test]
    #[test]
    fn test_signaling_bound_event_again_keeps_owner() {
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 1);

        checker.on_operation_submitted(&copy(Some(e[0]), &[])).unwrap();
        let n0 = checker.node_of(e[0]).unwrap();
        let op0 = checker.describe(n0);
        checker.on_operation_submitted(&barrier(Some(e[0]), &[])).unwrap();

        assert_eq!(checker.node_of(e[0]), Some(n0));
        assert_eq!(checker.describe(n0), op0);
        assert_eq!(terminator.count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_future_event_cycle_detected() {
        // op0 waits on e2 before anything signals it; op2 later closes the loop.
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 3);

        checker.on_operation_submitted(&copy(Some(e[0]), &[e[2]])).unwrap();
        assert!(matches!(checker.binding(e[2]), Some(EventBinding::Pending(_))));

        checker.on_operation_submitted(&copy(Some(e[1]), &[e[0]])).unwrap();
        let result = checker.on_operation_submitted(&copy(Some(e[2]), &[e[1]]));

        assert!(matches!(result, Err(Violation::Deadlock(_))));
        assert_eq!(terminator.count(), 1);
    }

    #[traced_test]
    #[test]
    fn test_unknown_wait_event_is_fatal_and_pure() {
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 1);
        let never_created = handles.event();

        let before = checker.stats();
        let result = checker.on_operation_submitted(&copy(Some(e[0]), &[never_created]));

        assert_eq!(
            result,
            Err(Violation::UnknownWaitEvent {
                api: "zeCommandListAppendMemoryCopy",
                event: never_created,
            })
        );
        assert_eq!(checker.stats(), before);
        assert_eq!(checker.binding(e[0]), Some(EventBinding::Unassigned));
        assert_eq!(terminator.count(), 1);
        assert!(logs_contain("Wait on unknown event"));
    }

    #[traced_test]
    #[test]
    fn test_unknown_signal_event_is_fatal() {
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let never_created = handles.event();

        let result = checker.on_operation_submitted(&barrier(Some(never_created), &[]));

        assert!(matches!(result, Err(Violation::UnknownSignalEvent { .. })));
        assert_eq!(checker.stats().nodes, 0);
        assert_eq!(terminator.count(), 1);
    }

    #[traced_test]
    #[test]
    fn test_wait_on_destroyed_event_is_fatal() {
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 1);
        checker.on_event_destroyed(e[0]).unwrap();

        let result = checker.on_operation_submitted(&barrier(None, &[e[0]]));
        assert!(matches!(result, Err(Violation::UnknownWaitEvent { .. })));
        assert_eq!(terminator.count(), 1);
    }

    #[traced_test]
    #[test]
    fn test_self_wait_is_deadlock() {
        let (checker, _) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 1);

        let result = checker.on_operation_submitted(&copy(Some(e[0]), &[e[0]]));

        let Err(Violation::Deadlock(report)) = result else {
            panic!("expected deadlock, got {result:?}");
        };
        assert_eq!(report.signaler.node, report.waiter.node);
        assert_eq!(report.path.len(), 1);
    }

    #[traced_test]
    #[test]
    fn test_anonymous_operation_records_waits() {
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 2);
        checker.on_operation_submitted(&copy(Some(e[0]), &[])).unwrap();

        let wait_all = Submission::new(CommandListHandle(1), Operation::WaitOnEvents)
            .with_waits([e[0], e[1]]);
        checker.on_operation_submitted(&wait_all).unwrap();

        let stats = checker.stats();
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.edges, 2);
        assert_eq!(stats.actions, 2);
        assert!(matches!(checker.binding(e[1]), Some(EventBinding::Pending(_))));
        assert_eq!(terminator.count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_duplicate_waits_are_harmless() {
        let (checker, _) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 2);

        checker.on_operation_submitted(&copy(Some(e[0]), &[])).unwrap();
        checker
            .on_operation_submitted(&copy(Some(e[1]), &[e[0], e[0]]))
            .unwrap();
        assert_eq!(checker.stats().edges, 1);
    }

    #[traced_test]
    #[test]
    fn test_destroy_does_not_affect_unrelated_work() {
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 4);
        linear_chain(&checker, &e[..3]);

        checker.on_event_destroyed(e[0]).unwrap();
        checker.on_operation_submitted(&copy(Some(e[3]), &[e[2]])).unwrap();

        assert_eq!(checker.binding(e[0]), None);
        assert_eq!(terminator.count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_reused_handle_gets_fresh_action() {
        let (checker, _) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 1);

        checker.on_operation_submitted(&copy(Some(e[0]), &[])).unwrap();
        let old = checker.node_of(e[0]).unwrap();
        let old_description = checker.describe(old);

        checker.on_event_destroyed(e[0]).unwrap();
        checker.on_event_created(e[0]).unwrap();
        assert_eq!(checker.binding(e[0]), Some(EventBinding::Unassigned));

        checker.on_operation_submitted(&barrier(Some(e[0]), &[])).unwrap();
        let new = checker.node_of(e[0]).unwrap();

        assert_ne!(old, new);
        assert_eq!(checker.describe(old), old_description);
        assert!(checker.describe(new).starts_with("zeCommandListAppendBarrier"));
    }

    #[traced_test]
    #[test]
    fn test_host_reset_breaks_false_cycle() {
        // After a host reset the event belongs to a new signal generation, so
        // waiting on its earlier signaler is not a cycle.
        let (checker, terminator) = make_checker();
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 2);

        checker.on_operation_submitted(&copy(Some(e[0]), &[])).unwrap();
        checker.on_operation_submitted(&copy(Some(e[1]), &[e[0]])).unwrap();
        checker.on_event_host_reset(e[0]).unwrap();
        checker.on_operation_submitted(&copy(Some(e[0]), &[e[1]])).unwrap();

        assert_eq!(terminator.count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_report_path_is_bounded() {
        let (checker, _) = make_checker_with(CheckerConfig::default().with_max_path_len(3));
        let mut handles = HandleFactory::new();
        let e = create_events(&checker, &mut handles, 6);

        checker.on_operation_submitted(&copy(Some(e[0]), &[])).unwrap();
        for i in 1..e.len() {
            checker
                .on_operation_submitted(&copy(Some(e[i]), &[e[i - 1]]))
                .unwrap();
        }

        let result = checker.on_operation_submitted(&barrier(Some(e[0]), &[e[5]]));
        let Err(Violation::Deadlock(report)) = result else {
            panic!("expected deadlock, got {result:?}");
        };
        assert_eq!(report.path.len(), 3);
        assert!(report.truncated);
    }

    #[test]
    fn test_concurrent_submissions_stay_consistent() {
        let (checker, terminator) = make_checker();
        let checker = Arc::new(checker);
        let mut handles = HandleFactory::new();
        let chains: Vec<Vec<EventHandle>> = (0..4)
            .map(|_| create_events(&checker, &mut handles, 16))
            .collect();

        let threads: Vec<_> = chains
            .into_iter()
            .map(|chain| {
                let checker = Arc::clone(&checker);
                std::thread::spawn(move || {
                    checker.on_operation_submitted(&copy(Some(chain[0]), &[])).unwrap();
                    for pair in chain.windows(2) {
                        checker
                            .on_operation_submitted(&copy(Some(pair[1]), &[pair[0]]))
                            .unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let stats = checker.stats();
        assert_eq!(stats.nodes, 64);
        assert_eq!(stats.edges, 60);
        assert_eq!(terminator.count(), 0);
    }
}
