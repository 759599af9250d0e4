//! Event deadlock checker.
//!
//! Operations appended to command lists may signal one event and wait on
//! any number of others. Each operation owns a node in a dependency graph,
//! and waiting on an event adds an edge from the node that signals the event
//! to the waiting node. The graph stays acyclic; an append whose wait would
//! close a cycle can never complete, so it is reported before the runtime
//! blocks on it.
//!
//! # Architecture
//!
//! ```text
//! ValidationLayer (prologue / epilogue)
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ DeadlockChecker.on_operation_submitted(submission)          │
//! │                                                             │
//! │   1. EventRegistry: resolve signal event to a node          │
//! │   2. ActionLog: record the operation against that node      │
//! │   3. EventRegistry: resolve each wait event to a node       │
//! │   4. DependencyGraph: insert signaler -> waiter edges       │
//! │   5. On refusal: build DeadlockReport, call Terminator      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`DeadlockChecker`] - Orchestrator, implements `ValidationChecker`
//! - [`EventRegistry`] - Event handle to graph node bindings
//! - [`ActionLog`] - Node to operation description, for diagnostics
//! - [`CheckerConfig`] - Diagnostic and sizing options

mod action_log;
mod checker;
mod config;
mod registry;

pub use action_log::{ActionLog, ActionRecord, UNRECORDED};
pub use checker::{CheckerStats, DeadlockChecker, CHECKER_NAME};
pub use config::{CheckerConfig, DEFAULT_MAX_PATH_LEN};
pub use registry::{EventBinding, EventRegistry};
