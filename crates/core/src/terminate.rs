//! Termination strategies.

use crate::Violation;
use tracing::error;

/// Decides what happens once a checker has detected a violation.
///
/// The runtime would hang (deadlock) or misbehave (unknown event) as soon as
/// the offending call executes, so the production strategy never returns.
/// Tests and report-only tools inject a strategy that does.
pub trait Terminator: Send + Sync {
    /// Report `violation`. Implementations may end the process.
    fn terminate(&self, violation: &Violation);
}

/// Writes the violation to stderr and aborts the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortTerminator;

impl Terminator for AbortTerminator {
    fn terminate(&self, violation: &Violation) {
        error!(kind = violation.kind(), "Fatal validation error, aborting");
        eprintln!("ERROR: {violation}");
        std::process::abort();
    }
}

/// Logs the violation and lets the caller continue.
///
/// The violation still reaches the caller as an `Err`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyTerminator;

impl Terminator for LogOnlyTerminator {
    fn terminate(&self, violation: &Violation) {
        error!(kind = violation.kind(), "{violation}");
    }
}
