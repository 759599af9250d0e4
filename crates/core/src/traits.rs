//! Checker trait.

use crate::Violation;
use eventlock_types::{EventHandle, Submission};

/// A checker driven by the validation layer.
///
/// This is the whole capability set a checker needs: it is notified of event
/// lifecycle changes and of operations appended with event dependencies.
///
/// # Guarantees expected of implementors
///
/// - **Synchronous**: Every notification completes on the calling thread
/// - **Thread-safe**: Notifications may arrive concurrently from many threads
/// - **No I/O**: Apart from reporting a violation through the terminator
///
/// # Example
///
/// ```ignore
/// impl ValidationChecker for DeadlockChecker {
///     fn name(&self) -> &'static str {
///         "events_deadlock"
///     }
///
///     fn on_operation_submitted(&self, submission: &Submission) -> Result<(), Violation> {
///         let mut state = self.state.lock();
///         state.submit(submission)
///     }
///     // ... etc
/// }
/// ```
pub trait ValidationChecker: Send + Sync {
    /// Stable name used for registration and logging.
    fn name(&self) -> &'static str;

    /// An event was created. Called from the epilogue with the new handle.
    fn on_event_created(&self, event: EventHandle) -> Result<(), Violation>;

    /// An event is about to be destroyed. Called from the prologue.
    fn on_event_destroyed(&self, event: EventHandle) -> Result<(), Violation>;

    /// An event is about to be reset from the host. Called from the prologue.
    ///
    /// Checkers that do not care about resets can rely on the default.
    fn on_event_host_reset(&self, event: EventHandle) -> Result<(), Violation> {
        let _ = event;
        Ok(())
    }

    /// An operation is about to be appended. Called from the prologue.
    ///
    /// # Returns
    ///
    /// `Err` only if the configured terminator returned instead of ending the
    /// process, so the caller can observe the violation.
    fn on_operation_submitted(&self, submission: &Submission) -> Result<(), Violation>;
}
