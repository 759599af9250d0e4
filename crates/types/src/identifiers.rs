//! Handle and identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque event handle.
///
/// Unique while the event is live. The runtime may hand out the same bit
/// pattern again after the event has been destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventHandle(pub u64);

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({:#x})", self.0)
    }
}

/// Opaque event pool handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventPoolHandle(pub u64);

impl fmt::Display for EventPoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventPool({:#x})", self.0)
    }
}

/// Opaque command list handle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommandListHandle(pub u64);

impl fmt::Display for CommandListHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandList({:#x})", self.0)
    }
}

/// Dependency graph node identifier.
///
/// Dense index in `[0, N)`, allocated in order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a node id from an arena index.
    ///
    /// # Panics
    ///
    /// Panics if the index does not fit in a `u32`.
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("node index exceeds u32::MAX"))
    }

    /// Get the arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
