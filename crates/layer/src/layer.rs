//! Checker registration and call dispatch.

use crate::LayerConfig;
use eventlock_checker::{DeadlockChecker, CHECKER_NAME};
use eventlock_core::{ApiCall, CallOutcome, Terminator, ValidationChecker, Violation};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes intercepted calls to the registered checkers.
///
/// Owns its checkers: they are constructed on activation and released on
/// [`shutdown`](Self::shutdown) or drop. There is no global instance; the
/// interception framework holds the layer and passes it every call.
#[derive(Default)]
pub struct ValidationLayer {
    checkers: Vec<Arc<dyn ValidationChecker>>,
    deadlock: Option<Arc<DeadlockChecker>>,
}

impl ValidationLayer {
    /// Create a layer, constructing and registering the enabled checkers.
    pub fn new(config: LayerConfig, terminator: Arc<dyn Terminator>) -> Self {
        let mut layer = Self::default();
        if config.events_deadlock {
            let checker = Arc::new(DeadlockChecker::new(config.checker, terminator));
            layer.register(checker.clone());
            layer.deadlock = Some(checker);
        } else {
            debug!("Event deadlock checker disabled");
        }
        layer
    }

    /// Add a checker. A checker with an already registered name is ignored.
    ///
    /// Returns `true` if the checker was added.
    pub fn register(&mut self, checker: Arc<dyn ValidationChecker>) -> bool {
        let name = checker.name();
        if self.is_active(name) {
            warn!(checker = name, "Checker already registered");
            return false;
        }
        info!(checker = name, "Registered checker");
        self.checkers.push(checker);
        true
    }

    /// Remove the checker registered under `name`.
    ///
    /// Returns `true` if a checker was removed.
    pub fn deregister(&mut self, name: &str) -> bool {
        let before = self.checkers.len();
        self.checkers.retain(|checker| checker.name() != name);
        if name == CHECKER_NAME {
            self.deadlock = None;
        }
        let removed = self.checkers.len() != before;
        if removed {
            info!(checker = name, "Deregistered checker");
        }
        removed
    }

    /// Remove every checker.
    pub fn shutdown(&mut self) {
        let names = self.checker_names();
        for name in names {
            self.deregister(name);
        }
    }

    /// Check whether a checker named `name` is registered.
    pub fn is_active(&self, name: &str) -> bool {
        self.checkers.iter().any(|checker| checker.name() == name)
    }

    /// Names of the registered checkers, in registration order.
    pub fn checker_names(&self) -> Vec<&'static str> {
        self.checkers.iter().map(|checker| checker.name()).collect()
    }

    /// The deadlock checker, if enabled and still registered.
    pub fn deadlock_checker(&self) -> Option<&Arc<DeadlockChecker>> {
        self.deadlock.as_ref()
    }

    /// Notify checkers before the runtime executes `call`.
    ///
    /// Destroy, reset and append calls are checked here, since their
    /// arguments are complete before the call runs.
    pub fn prologue(&self, call: &ApiCall) -> Result<(), Violation> {
        for checker in &self.checkers {
            match call {
                ApiCall::EventCreate { .. } => {}
                ApiCall::EventDestroy { event } => checker.on_event_destroyed(*event)?,
                ApiCall::EventHostReset { event } => checker.on_event_host_reset(*event)?,
                ApiCall::Append(submission) => checker.on_operation_submitted(submission)?,
            }
        }
        Ok(())
    }

    /// Notify checkers after the runtime executed `call`.
    ///
    /// Only event creation is handled here: the new handle exists once the
    /// call has succeeded.
    pub fn epilogue(&self, call: &ApiCall, outcome: &CallOutcome) -> Result<(), Violation> {
        let ApiCall::EventCreate { pool, index } = call else {
            return Ok(());
        };
        let CallOutcome::Created(event) = outcome else {
            debug!(%pool, index, ?outcome, "Event create did not return a handle");
            return Ok(());
        };
        for checker in &self.checkers {
            checker.on_event_created(*event)?;
        }
        Ok(())
    }
}

impl Drop for ValidationLayer {
    fn drop(&mut self) {
        if !self.checkers.is_empty() {
            self.shutdown();
        }
    }
}
