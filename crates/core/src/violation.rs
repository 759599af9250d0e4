//! Violations reported by checkers.

use eventlock_types::{EventHandle, NodeId};
use std::fmt;
use thiserror::Error;

/// An action (submitted operation) as shown in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSummary {
    /// Graph node owned by the action.
    pub node: NodeId,
    /// Description of the operation, or `<unrecorded>` for a placeholder node.
    pub description: String,
    /// Event the action signals, if known.
    pub signal: Option<EventHandle>,
}

impl fmt::Display for ActionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.node, self.description)
    }
}

/// Diagnostic for a refused wait edge.
///
/// The edge `signaler -> waiter` was refused because `path` already leads
/// from `waiter` back to `signaler`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlockReport {
    /// The event whose wait closed the cycle.
    pub wait_event: EventHandle,
    /// Action that signals `wait_event`.
    pub signaler: ActionSummary,
    /// Action being submitted, which waits on `wait_event`.
    pub waiter: ActionSummary,
    /// Existing path from `waiter` to `signaler`, bounded in length.
    pub path: Vec<ActionSummary>,
    /// True when the existing path is longer than `path`.
    pub truncated: bool,
}

impl fmt::Display for DeadlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Waiting on {} would create a cycle in the event dependency graph.",
            self.wait_event
        )?;
        writeln!(f, "  Refused dependency:")?;
        writeln!(f, "    from: {}", self.signaler)?;
        writeln!(f, "    to:   {}", self.waiter)?;
        write!(f, "  Existing path:")?;
        for step in &self.path {
            write!(f, "\n    {step}")?;
        }
        if self.truncated {
            write!(f, "\n    ... (path truncated)")?;
        }
        Ok(())
    }
}

/// A problem detected by a checker.
///
/// Every violation is fatal for the process under the default terminator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Violation {
    /// An operation waits on an event that does not exist.
    #[error("{api} waits on {event}, which was never created or has been destroyed")]
    UnknownWaitEvent {
        api: &'static str,
        event: EventHandle,
    },

    /// An operation signals an event that does not exist.
    #[error("{api} signals {event}, which was never created or has been destroyed")]
    UnknownSignalEvent {
        api: &'static str,
        event: EventHandle,
    },

    /// A wait edge would close a cycle.
    #[error("potential event deadlock\n{0}")]
    Deadlock(Box<DeadlockReport>),
}

impl Violation {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Violation::UnknownWaitEvent { .. } => "unknown_wait_event",
            Violation::UnknownSignalEvent { .. } => "unknown_signal_event",
            Violation::Deadlock(_) => "deadlock",
        }
    }
}
