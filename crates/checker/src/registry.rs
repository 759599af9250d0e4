//! Event handle to graph node bindings.

use eventlock_graph::DependencyGraph;
use eventlock_types::{EventHandle, NodeId};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Graph binding of a live event.
///
/// A handle with no entry at all is unknown: never created, or destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBinding {
    /// The event exists but no node has been reserved for it.
    Unassigned,
    /// Some operation waits on the event, but the operation that signals it
    /// has not been submitted yet. The node is a placeholder.
    Pending(NodeId),
    /// The event is the signal event of a submitted operation.
    Bound(NodeId),
}

impl EventBinding {
    /// The node associated with the event, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            EventBinding::Unassigned => None,
            EventBinding::Pending(node) | EventBinding::Bound(node) => Some(*node),
        }
    }
}

/// Maps live event handles to graph nodes.
///
/// Nodes are allocated lazily, at most once per handle generation. A
/// generation starts when the handle is created (or reset from the host)
/// and ends when it is destroyed.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: HashMap<EventHandle, EventBinding>,
}

impl EventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created event.
    ///
    /// A handle that is still registered (the runtime reused its bit pattern)
    /// starts a fresh generation. Returns the previous binding, if any.
    pub fn on_event_created(&mut self, handle: EventHandle) -> Option<EventBinding> {
        let previous = self.events.insert(handle, EventBinding::Unassigned);
        if let Some(previous) = previous {
            debug!(event = %handle, ?previous, "Event handle re-created while registered");
        }
        previous
    }

    /// Forget a destroyed event.
    ///
    /// The graph is not touched: the event's node and edges stay behind.
    pub fn on_event_destroyed(&mut self, handle: EventHandle) -> Option<EventBinding> {
        self.events.remove(&handle)
    }

    /// Start a new signal generation for a known event.
    ///
    /// Returns `false` if the handle is unknown.
    pub fn on_event_reset(&mut self, handle: EventHandle) -> bool {
        match self.events.get_mut(&handle) {
            Some(binding) => {
                *binding = EventBinding::Unassigned;
                true
            }
            None => false,
        }
    }

    /// Check whether `handle` is a live event.
    pub fn contains(&self, handle: EventHandle) -> bool {
        self.events.contains_key(&handle)
    }

    /// Current binding of `handle`, or `None` if unknown.
    pub fn binding(&self, handle: EventHandle) -> Option<EventBinding> {
        self.events.get(&handle).copied()
    }

    /// Node for an event referenced as a wait dependency.
    ///
    /// Reserves a placeholder node if the event has none yet. Returns `None`
    /// for an unknown handle, without touching the graph.
    pub fn resolve_as_wait(
        &mut self,
        handle: EventHandle,
        graph: &mut DependencyGraph,
    ) -> Option<NodeId> {
        let binding = self.events.get_mut(&handle)?;
        match *binding {
            EventBinding::Pending(node) | EventBinding::Bound(node) => Some(node),
            EventBinding::Unassigned => {
                let node = graph.new_node();
                *binding = EventBinding::Pending(node);
                trace!(event = %handle, %node, "Reserved placeholder node for wait");
                Some(node)
            }
        }
    }

    /// Node for an event referenced as a signal event.
    ///
    /// Claims a placeholder reserved by an earlier wait, keeps an existing
    /// binding, or allocates a new node. The flag is `true` when this call
    /// bound the event, and `false` when it was already bound. Returns `None`
    /// for an unknown handle, without touching the graph.
    pub fn resolve_as_signal(
        &mut self,
        handle: EventHandle,
        graph: &mut DependencyGraph,
    ) -> Option<(NodeId, bool)> {
        let binding = self.events.get_mut(&handle)?;
        let resolved = match *binding {
            EventBinding::Bound(node) => (node, false),
            EventBinding::Pending(node) => (node, true),
            EventBinding::Unassigned => (graph.new_node(), true),
        };
        *binding = EventBinding::Bound(resolved.0);
        Some(resolved)
    }

    /// Number of live events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if no event is live.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_reserves_node_once() {
        let mut registry = EventRegistry::new();
        let mut graph = DependencyGraph::new();
        let event = EventHandle(1);

        assert!(registry.on_event_created(event).is_none());
        assert_eq!(registry.binding(event), Some(EventBinding::Unassigned));

        let first = registry.resolve_as_wait(event, &mut graph).unwrap();
        let second = registry.resolve_as_wait(event, &mut graph).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.binding(event), Some(EventBinding::Pending(first)));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_signal_claims_pending_node() {
        let mut registry = EventRegistry::new();
        let mut graph = DependencyGraph::new();
        let event = EventHandle(1);
        registry.on_event_created(event);

        let placeholder = registry.resolve_as_wait(event, &mut graph).unwrap();
        let (claimed, first_bind) = registry.resolve_as_signal(event, &mut graph).unwrap();
        assert_eq!(placeholder, claimed);
        assert!(first_bind);
        assert_eq!(registry.binding(event), Some(EventBinding::Bound(claimed)));

        // Signaling again keeps the same node and owner.
        assert_eq!(
            registry.resolve_as_signal(event, &mut graph),
            Some((claimed, false))
        );
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_unknown_handle_leaves_graph_alone() {
        let mut registry = EventRegistry::new();
        let mut graph = DependencyGraph::new();

        assert!(registry.resolve_as_wait(EventHandle(7), &mut graph).is_none());
        assert!(registry.resolve_as_signal(EventHandle(7), &mut graph).is_none());
        assert!(!registry.on_event_reset(EventHandle(7)));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_destroy_and_recreate_starts_new_generation() {
        let mut registry = EventRegistry::new();
        let mut graph = DependencyGraph::new();
        let event = EventHandle(1);

        registry.on_event_created(event);
        let (old, _) = registry.resolve_as_signal(event, &mut graph).unwrap();

        assert_eq!(
            registry.on_event_destroyed(event),
            Some(EventBinding::Bound(old))
        );
        assert!(!registry.contains(event));
        assert!(registry.is_empty());

        registry.on_event_created(event);
        let (new, first_bind) = registry.resolve_as_signal(event, &mut graph).unwrap();
        assert!(first_bind);
        assert_ne!(old, new);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_reset_unbinds_known_event() {
        let mut registry = EventRegistry::new();
        let mut graph = DependencyGraph::new();
        let event = EventHandle(1);

        registry.on_event_created(event);
        let (first, _) = registry.resolve_as_signal(event, &mut graph).unwrap();
        assert!(registry.on_event_reset(event));
        assert_eq!(registry.binding(event), Some(EventBinding::Unassigned));

        let (second, _) = registry.resolve_as_signal(event, &mut graph).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_recreate_without_destroy_returns_previous() {
        let mut registry = EventRegistry::new();
        let mut graph = DependencyGraph::new();
        let event = EventHandle(1);

        registry.on_event_created(event);
        let node = registry.resolve_as_wait(event, &mut graph).unwrap();
        assert_eq!(
            registry.on_event_created(event),
            Some(EventBinding::Pending(node))
        );
        assert_eq!(registry.binding(event), Some(EventBinding::Unassigned));
        assert_eq!(registry.len(), 1);
    }
}
