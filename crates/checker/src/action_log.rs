//! Node to action descriptions, for diagnostics only.

use eventlock_core::ActionSummary;
use eventlock_types::{EventHandle, NodeId};
use std::collections::HashMap;

/// Description used for nodes that no submitted operation has claimed.
pub const UNRECORDED: &str = "<unrecorded>";

/// The operation that claimed a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Human-readable description of the operation.
    pub description: String,
    /// Event the operation signals.
    pub signal: Option<EventHandle>,
}

/// Maps claimed graph nodes to the operations that own them.
#[derive(Debug, Default)]
pub struct ActionLog {
    actions: HashMap<NodeId, ActionRecord>,
}

impl ActionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the operation owning `node`, replacing any earlier record.
    pub fn record(&mut self, node: NodeId, description: String, signal: Option<EventHandle>) {
        self.actions.insert(
            node,
            ActionRecord {
                description,
                signal,
            },
        );
    }

    /// Get the record for `node`.
    pub fn get(&self, node: NodeId) -> Option<&ActionRecord> {
        self.actions.get(&node)
    }

    /// Description of the operation owning `node`, or [`UNRECORDED`].
    pub fn describe(&self, node: NodeId) -> &str {
        self.actions
            .get(&node)
            .map_or(UNRECORDED, |record| record.description.as_str())
    }

    /// Summary of `node` for a diagnostic report.
    pub fn summary(&self, node: NodeId) -> ActionSummary {
        ActionSummary {
            node,
            description: self.describe(node).to_string(),
            signal: self.get(node).and_then(|record| record.signal),
        }
    }

    /// Number of recorded actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if no action has been recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
