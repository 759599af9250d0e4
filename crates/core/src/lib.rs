//! Core abstractions shared by checkers and the validation layer.
//!
//! - [`ApiCall`] / [`CallOutcome`]: the intercepted calls a checker observes
//! - [`ValidationChecker`]: the notifications a checker implements
//! - [`Violation`]: everything a checker can report
//! - [`Terminator`]: what happens to the process once a violation is reported

mod call;
mod terminate;
mod traits;
mod violation;

pub use call::{ApiCall, CallOutcome};
pub use terminate::{AbortTerminator, LogOnlyTerminator, Terminator};
pub use traits::ValidationChecker;
pub use violation::{ActionSummary, DeadlockReport, Violation};
