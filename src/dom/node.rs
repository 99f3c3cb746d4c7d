//! Node types for the document arena.

use std::collections::HashMap;
use std::fmt;

// =============================================================================
// NODE ID
// =============================================================================

/// Handle to a node in the document arena.
///
/// Plain index into the arena slab. Ids are reused after a node is
/// destroyed, like component indices in any arena-backed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// NODE FLAGS
// =============================================================================

bitflags::bitflags! {
    /// Per-node behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Transient measurement helper. Probes never match selectors,
        /// never generate mutation records, and never render.
        const PROBE = 1 << 0;
        /// Excluded from rendering.
        const HIDDEN = 1 << 1;
    }
}

// =============================================================================
// NODE
// =============================================================================

/// One element in the document tree.
///
/// Attributes and style properties are opaque string key/value sets; the
/// layout and clamp modules interpret the handful of keys they care about.
#[derive(Debug, Default)]
pub struct Node {
    pub tag: String,
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub styles: HashMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub flags: NodeFlags,
}

impl Node {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// Whether this node is a measurement probe.
    pub fn is_probe(&self) -> bool {
        self.flags.contains(NodeFlags::PROBE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_empty() {
        let node = Node::new("p");
        assert_eq!(node.tag, "p");
        assert!(node.text.is_empty());
        assert!(node.children.is_empty());
        assert!(node.parent.is_none());
        assert!(!node.is_probe());
    }

    #[test]
    fn test_probe_flag() {
        let mut node = Node::new("probe");
        node.flags |= NodeFlags::PROBE;
        assert!(node.is_probe());
    }
}
