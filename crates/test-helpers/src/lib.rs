//! Test fixtures shared across the workspace.
//!
//! - [`RecordingTerminator`] captures violations instead of ending the process
//! - [`HandleFactory`] hands out event handles
//! - [`copy`] and [`barrier`] build submissions with minimal noise

use eventlock_core::{Terminator, Violation};
use eventlock_types::{CommandListHandle, EventHandle, Operation, Submission};
use parking_lot::Mutex;
use std::sync::Arc;

/// Terminator that records every violation and returns.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    violations: Mutex<Vec<Violation>>,
}

impl RecordingTerminator {
    /// Create a shared recording terminator.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of violations recorded so far.
    pub fn count(&self) -> usize {
        self.violations.lock().len()
    }

    /// The most recent violation, if any.
    pub fn last(&self) -> Option<Violation> {
        self.violations.lock().last().cloned()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, violation: &Violation) {
        self.violations.lock().push(violation.clone());
    }
}

/// Hands out distinct handles, like a null driver would.
#[derive(Debug)]
pub struct HandleFactory {
    next: u64,
}

impl Default for HandleFactory {
    fn default() -> Self {
        Self { next: 0x1000 }
    }
}

impl HandleFactory {
    /// Create a factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused event handle.
    pub fn event(&mut self) -> EventHandle {
        let event = EventHandle(self.next);
        self.next += 0x10;
        event
    }

    /// `n` unused event handles.
    pub fn events(&mut self, n: usize) -> Vec<EventHandle> {
        (0..n).map(|_| self.event()).collect()
    }
}

/// A 1 KiB memory copy that signals `signal` and waits on `waits`.
pub fn copy(signal: Option<EventHandle>, waits: &[EventHandle]) -> Submission {
    let submission = Submission::new(
        CommandListHandle(0xc0),
        Operation::MemoryCopy {
            dst: 0xd000,
            src: 0x4000,
            size: 1024,
        },
    )
    .with_waits(waits.iter().copied());
    match signal {
        Some(event) => submission.with_signal(event),
        None => submission,
    }
}

/// A barrier that signals `signal` and waits on `waits`.
pub fn barrier(signal: Option<EventHandle>, waits: &[EventHandle]) -> Submission {
    Submission {
        command_list: CommandListHandle(0xc0),
        operation: Operation::Barrier,
        signal,
        waits: waits.to_vec(),
    }
}
