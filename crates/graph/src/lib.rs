//! Acyclic dependency graph for event wait relationships.
//!
//! The graph keeps a total order over its nodes that is consistent with every
//! edge. Inserting an edge that already agrees with the order is O(1); an edge
//! against the order triggers a search bounded to the affected rank range and,
//! if no cycle is found, a local reordering of just the nodes it visited.
//!
//! # Components
//!
//! - [`NodeStore`] - Arena of nodes with dense ids
//! - [`DependencyGraph`] - Edge insertion with cycle refusal and path queries
//! - [`GraphPath`] - Bounded path returned for diagnostics

mod graph;
mod store;

pub use graph::{DependencyGraph, GraphPath, GraphStats, InvariantViolation};
pub use store::NodeStore;
