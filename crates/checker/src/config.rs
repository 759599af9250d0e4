//! Configuration for the deadlock checker.

/// Default number of nodes shown for the existing path in a deadlock report.
pub const DEFAULT_MAX_PATH_LEN: usize = 10;

/// Configuration for the deadlock checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Maximum number of actions listed for the existing path in a report.
    ///
    /// Longer paths are cut off and marked as truncated.
    pub max_path_len: usize,

    /// Number of graph nodes to reserve up front.
    pub node_capacity: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_path_len: DEFAULT_MAX_PATH_LEN,
            node_capacity: 0,
        }
    }
}

impl CheckerConfig {
    /// Set the maximum reported path length.
    pub fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.max_path_len = max_path_len;
        self
    }

    /// Set the number of graph nodes to reserve up front.
    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity;
        self
    }
}
