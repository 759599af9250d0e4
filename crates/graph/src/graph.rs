//! Incremental topological order maintenance.
//!
//! Every node has a unique rank and every edge `x -> y` satisfies
//! `rank(x) < rank(y)`. Inserting `x -> y` with `rank(x) > rank(y)` needs repair:
//!
//! ```text
//!  rank:   low ─────────────────────────────────────────── high
//!               y ──► … (forward from y, ranks < rank(x))
//!                          … ──► x (backward from x, ranks > rank(y))
//! ```
//!
//! If the forward search from `y` reaches `x`, the edge would close a cycle and
//! is refused. Otherwise the ranks held by both visited sets are pooled and
//! handed back so that everything that reaches `x` comes before everything
//! reachable from `y`. Nodes outside the two sets keep their ranks.

use crate::store::NodeStore;
use eventlock_types::NodeId;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Node and edge counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Nodes ever allocated.
    pub nodes: usize,
    /// Edges currently in the graph.
    pub edges: usize,
}

/// A bounded path through the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPath {
    /// The first nodes of the path, starting at the search origin.
    pub nodes: Vec<NodeId>,
    /// True when the full path is longer than `nodes`.
    pub truncated: bool,
}

/// Broken internal invariant, reported by [`DependencyGraph::check_invariants`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Two nodes share a rank, or a rank is out of range.
    #[error("ranks are not a permutation of 0..{0}")]
    RankNotPermutation(usize),

    /// An edge points backwards in the order.
    #[error("edge {from} -> {to} violates order ({from_rank} >= {to_rank})")]
    EdgeAgainstOrder {
        from: NodeId,
        to: NodeId,
        from_rank: usize,
        to_rank: usize,
    },

    /// Forward and reverse adjacency disagree.
    #[error("edge {from} -> {to} is missing from the predecessor set")]
    AdjacencyMismatch { from: NodeId, to: NodeId },

    /// A search left a node marked as visited.
    #[error("node {0} still marked visited")]
    StaleVisitedFlag(NodeId),

    /// The cached edge count is wrong.
    #[error("edge count {cached} does not match {actual}")]
    EdgeCount { cached: usize, actual: usize },
}

/// Directed acyclic graph over [`NodeId`]s.
///
/// [`try_insert_edge`](Self::try_insert_edge) is the only way to add edges
/// and never creates a cycle.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    store: NodeStore,
    edge_count: usize,

    // Scratch buffers reused across insertions.
    deltaf: Vec<NodeId>,
    deltab: Vec<NodeId>,
    stack: Vec<NodeId>,
    merged: Vec<usize>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut graph = Self::default();
        graph.reserve(capacity);
        graph
    }

    /// Allocate a new node, placed last in the order.
    pub fn new_node(&mut self) -> NodeId {
        let id = self.store.new_node();
        trace!(node = %id, "Allocated graph node");
        id
    }

    /// Reserve room for at least `additional` more nodes.
    pub fn reserve(&mut self, additional: usize) {
        self.store.reserve(additional);
    }

    /// Check whether `id` has been allocated.
    pub fn contains(&self, id: NodeId) -> bool {
        self.store.contains(id)
    }

    /// Number of nodes ever allocated.
    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Node and edge counts.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.store.len(),
            edges: self.edge_count,
        }
    }

    /// Check whether the edge `from -> to` exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.store.contains(from)
            && self.store.contains(to)
            && self.store.get(from).outs.contains(&to)
    }

    /// Successors of `id` in insertion order.
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.store
            .contains(id)
            .then(|| self.store.get(id).outs.iter().copied())
            .into_iter()
            .flatten()
    }

    /// Predecessors of `id` in insertion order.
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.store
            .contains(id)
            .then(|| self.store.get(id).ins.iter().copied())
            .into_iter()
            .flatten()
    }

    /// All nodes, sorted by their current position in the topological order.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut order: Vec<NodeId> = (0..self.store.len()).map(NodeId::from_index).collect();
        order.sort_by_key(|&id| self.store.get(id).rank);
        order
    }

    /// Insert `from -> to` unless it would close a cycle.
    ///
    /// Returns `true` if the edge is now present (newly added or already
    /// there). Returns `false`, leaving the graph unchanged, if the edge would
    /// create a cycle, is a self edge, or names an unallocated node.
    pub fn try_insert_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.store.contains(from) || !self.store.contains(to) {
            warn!(%from, %to, "Refusing edge between unallocated nodes");
            return false;
        }
        if from == to {
            debug!(node = %from, "Refusing self edge");
            return false;
        }
        if self.store.get(from).outs.contains(&to) {
            return true;
        }

        let from_rank = self.store.get(from).rank;
        let to_rank = self.store.get(to).rank;

        if from_rank > to_rank {
            if !self.forward_search(to, from_rank) {
                self.clear_visited_forward();
                debug!(%from, %to, "Edge would create a cycle");
                return false;
            }
            self.backward_search(from, to_rank);
            self.reorder();
            trace!(
                %from,
                %to,
                affected = self.deltaf.len() + self.deltab.len(),
                "Reordered affected range"
            );
        }

        self.store.get_mut(from).outs.insert(to);
        self.store.get_mut(to).ins.insert(from);
        self.edge_count += 1;
        true
    }

    /// Collect everything reachable from `start` with rank below `upper_bound`.
    ///
    /// Returns `false` as soon as the node holding `upper_bound` is reached.
    fn forward_search(&mut self, start: NodeId, upper_bound: usize) -> bool {
        let Self {
            store,
            deltaf,
            stack,
            ..
        } = self;
        deltaf.clear();
        stack.clear();
        stack.push(start);

        while let Some(n) = stack.pop() {
            let node = store.get_mut(n);
            if node.visited {
                continue;
            }
            node.visited = true;
            deltaf.push(n);

            let nodes = store.nodes();
            for &w in &nodes[n.index()].outs {
                let next = &nodes[w.index()];
                if next.rank == upper_bound {
                    return false;
                }
                if !next.visited && next.rank < upper_bound {
                    stack.push(w);
                }
            }
        }
        true
    }

    /// Collect everything that reaches `start` with rank above `lower_bound`.
    fn backward_search(&mut self, start: NodeId, lower_bound: usize) {
        let Self {
            store,
            deltab,
            stack,
            ..
        } = self;
        deltab.clear();
        stack.clear();
        stack.push(start);

        while let Some(n) = stack.pop() {
            let node = store.get_mut(n);
            if node.visited {
                continue;
            }
            node.visited = true;
            deltab.push(n);

            let nodes = store.nodes();
            for &w in &nodes[n.index()].ins {
                let prev = &nodes[w.index()];
                if !prev.visited && prev.rank > lower_bound {
                    stack.push(w);
                }
            }
        }
    }

    /// Hand the pooled ranks of both visited sets back, predecessors first.
    fn reorder(&mut self) {
        let Self {
            store,
            deltaf,
            deltab,
            merged,
            ..
        } = self;
        deltab.sort_by_key(|&id| store.get(id).rank);
        deltaf.sort_by_key(|&id| store.get(id).rank);

        merged.clear();
        merged.extend(deltab.iter().chain(deltaf.iter()).map(|&id| store.get(id).rank));
        merged.sort_unstable();

        for (&id, &rank) in deltab.iter().chain(deltaf.iter()).zip(merged.iter()) {
            let node = store.get_mut(id);
            node.rank = rank;
            node.visited = false;
        }
    }

    fn clear_visited_forward(&mut self) {
        for &id in &self.deltaf {
            self.store.get_mut(id).visited = false;
        }
    }

    /// Check whether `to` is reachable from `from`.
    ///
    /// Only nodes ranked between the two endpoints can lie on a path, so the
    /// search never leaves that range.
    pub fn is_reachable(&self, from: NodeId, to: NodeId) -> bool {
        if !self.store.contains(from) || !self.store.contains(to) {
            return false;
        }
        if from == to {
            return true;
        }
        let upper_bound = self.store.get(to).rank;
        if self.store.get(from).rank > upper_bound {
            return false;
        }

        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            if !seen.insert(n) {
                continue;
            }
            for &w in &self.store.get(n).outs {
                if w == to {
                    return true;
                }
                if self.store.get(w).rank < upper_bound {
                    stack.push(w);
                }
            }
        }
        false
    }

    /// Find a shortest path `from -> … -> to`, keeping at most `max_len` nodes.
    ///
    /// Diagnostic only. Returns `None` if `to` is unreachable.
    pub fn find_path(&self, from: NodeId, to: NodeId, max_len: usize) -> Option<GraphPath> {
        if !self.store.contains(from) || !self.store.contains(to) {
            return None;
        }
        let upper_bound = self.store.get(to).rank;
        if self.store.get(from).rank > upper_bound {
            return None;
        }

        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut found = from == to;
        while let Some(n) = queue.pop_front() {
            if found {
                break;
            }
            for &w in &self.store.get(n).outs {
                if w == from || parent.contains_key(&w) || self.store.get(w).rank > upper_bound {
                    continue;
                }
                parent.insert(w, n);
                if w == to {
                    found = true;
                    break;
                }
                queue.push_back(w);
            }
        }
        if !found {
            return None;
        }

        let mut nodes = vec![to];
        let mut cursor = to;
        while let Some(&prev) = parent.get(&cursor) {
            nodes.push(prev);
            cursor = prev;
        }
        nodes.reverse();

        let truncated = nodes.len() > max_len;
        nodes.truncate(max_len);
        Some(GraphPath { nodes, truncated })
    }

    /// Verify rank order, adjacency symmetry and scratch state.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let nodes = self.store.nodes();
        let mut ranks_seen = vec![false; nodes.len()];
        for node in nodes {
            match ranks_seen.get_mut(node.rank) {
                Some(seen) if !*seen => *seen = true,
                _ => return Err(InvariantViolation::RankNotPermutation(nodes.len())),
            }
        }

        let mut actual = 0;
        for (index, node) in nodes.iter().enumerate() {
            let from = NodeId::from_index(index);
            if node.visited {
                return Err(InvariantViolation::StaleVisitedFlag(from));
            }
            for &to in &node.outs {
                actual += 1;
                let to_rank = self.store.get(to).rank;
                if node.rank >= to_rank {
                    return Err(InvariantViolation::EdgeAgainstOrder {
                        from,
                        to,
                        from_rank: node.rank,
                        to_rank,
                    });
                }
                if !self.predecessors(to).any(|pred| pred == from) {
                    return Err(InvariantViolation::AdjacencyMismatch { from, to });
                }
            }
        }

        let ins_total: usize = nodes.iter().map(|node| node.ins.len()).sum();
        if actual != self.edge_count || ins_total != self.edge_count {
            return Err(InvariantViolation::EdgeCount {
                cached: self.edge_count,
                actual,
            });
        }
        Ok(())
    }
}
