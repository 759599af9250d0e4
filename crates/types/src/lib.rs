//! Core types shared by the event deadlock checker.
//!
//! Handles are opaque values handed out by the accelerator runtime; the checker
//! only stores and compares them. Node ids are dense indices into the
//! dependency graph.

mod identifiers;
mod operation;

pub use identifiers::{CommandListHandle, EventHandle, EventPoolHandle, NodeId};
pub use operation::{Operation, Submission};
