//! Intercepted API calls.

use eventlock_types::{EventHandle, EventPoolHandle, Submission};
use serde::{Deserialize, Serialize};

/// An intercepted API call, with its arguments.
///
/// The layer sees each call twice: once before the runtime runs it
/// (prologue) and once after (epilogue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ApiCall {
    // ═══════════════════════════════════════════════════════════════════════
    // Event lifecycle
    // ═══════════════════════════════════════════════════════════════════════
    /// Create an event in a pool. The handle is only known in the epilogue.
    EventCreate { pool: EventPoolHandle, index: u32 },

    /// Destroy an event.
    EventDestroy { event: EventHandle },

    /// Reset an event from the host so it can be signaled again.
    EventHostReset { event: EventHandle },

    // ═══════════════════════════════════════════════════════════════════════
    // Command list appends
    // ═══════════════════════════════════════════════════════════════════════
    /// Append an operation that may signal and wait on events.
    Append(Submission),
}

impl ApiCall {
    /// Name of the intercepted entry point.
    pub fn api_name(&self) -> &'static str {
        match self {
            ApiCall::EventCreate { .. } => "zeEventCreate",
            ApiCall::EventDestroy { .. } => "zeEventDestroy",
            ApiCall::EventHostReset { .. } => "zeEventHostReset",
            ApiCall::Append(submission) => submission.operation.api_name(),
        }
    }
}

/// Result of the underlying runtime call, passed to the epilogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The call succeeded.
    Success,
    /// An event create succeeded and returned this handle.
    Created(EventHandle),
    /// The call failed with the runtime's status code.
    Failed(i32),
}

impl CallOutcome {
    /// Check if the underlying call succeeded.
    pub fn is_success(&self) -> bool {
        !matches!(self, CallOutcome::Failed(_))
    }
}
