//! Node arena.

use eventlock_types::NodeId;
use indexmap::IndexSet;

/// A graph vertex.
///
/// Carries no payload; callers attach meaning through side maps keyed by
/// [`NodeId`].
#[derive(Debug)]
pub(crate) struct Node {
    /// Position in the maintained topological order. Unique across nodes.
    pub(crate) rank: usize,
    /// Scratch flag used by the bounded searches. False between calls.
    pub(crate) visited: bool,
    /// Predecessors (nodes with an edge into this one).
    pub(crate) ins: IndexSet<NodeId>,
    /// Successors (nodes this one has an edge to).
    pub(crate) outs: IndexSet<NodeId>,
}

/// Arena of graph nodes identified by dense integer ids.
///
/// Nodes are never removed, so ids stay valid for the lifetime of the store.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve room for at least `additional` more nodes.
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    /// Allocate the next unused node id.
    ///
    /// A new node is placed last in the topological order.
    pub fn new_node(&mut self) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            rank: self.nodes.len(),
            visited: false,
            ins: IndexSet::new(),
            outs: IndexSet::new(),
        });
        id
    }

    /// Check whether `id` has been allocated.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no node has been allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}
