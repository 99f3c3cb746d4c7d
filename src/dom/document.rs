//! Document tree - arena storage, mutation records, observers.
//!
//! A retained tree of element nodes in a thread-local slab, accessed
//! through free functions like the rest of the crate's state modules.
//!
//! Structural changes (child insertion and removal) queue mutation records;
//! content changes (text, styles, attributes) do not. Records sit in a
//! pending queue until [`deliver_mutations`] dispatches them, so a burst of
//! tree edits reaches observers as one batch and a controller rewriting its
//! own text can never re-enter the observer that created it.
//!
//! # API
//!
//! - `root()` - the permanent document root
//! - `create_element` / `append_child` / `remove_child` / `destroy_node`
//! - `text` / `set_text`, `attribute` / `set_attribute`, `style` / `set_style`
//! - `insert_probe` / `remove_probe` - transient measurement helpers
//! - `observe` / `unobserve` / `deliver_mutations`
//! - `query_selector_all` / `matches`
//! - `config` / `set_config` - renderer capabilities

use std::cell::RefCell;
use std::rc::Rc;

use slab::Slab;

use super::node::{Node, NodeFlags, NodeId};
use super::selector::Selector;

// =============================================================================
// TYPES
// =============================================================================

/// Capabilities of the renderer this document targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Whether the renderer clamps multi-line text natively via the
    /// `line-clamp` style property. When false, controllers shrink text
    /// manually against measured heights.
    pub native_line_clamp: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            native_line_clamp: true,
        }
    }
}

/// One structural change: nodes added to or removed from a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub parent: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

/// Token returned by [`observe`], used to disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverHandle(usize);

type ObserverFn = Rc<dyn Fn(&[MutationRecord])>;

struct Observer {
    id: usize,
    root: NodeId,
    callback: ObserverFn,
}

// =============================================================================
// STATE
// =============================================================================

struct Document {
    nodes: Slab<Node>,
    root: NodeId,
    config: DocumentConfig,
    pending: Vec<MutationRecord>,
    observers: Vec<Observer>,
    next_observer_id: usize,
}

impl Document {
    fn new() -> Self {
        let mut nodes = Slab::new();
        let root = NodeId(nodes.insert(Node::new("root")));
        Self {
            nodes,
            root,
            config: DocumentConfig::default(),
            pending: Vec::new(),
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }
}

thread_local! {
    static DOCUMENT: RefCell<Document> = RefCell::new(Document::new());
}

// =============================================================================
// CONFIG
// =============================================================================

/// Current renderer capabilities.
pub fn config() -> DocumentConfig {
    DOCUMENT.with(|doc| doc.borrow().config)
}

/// Set renderer capabilities. Call once at startup, before controllers
/// bind; the excerpt algorithm reads the flag on every run but nothing
/// re-probes it.
pub fn set_config(config: DocumentConfig) {
    DOCUMENT.with(|doc| doc.borrow_mut().config = config);
}

// =============================================================================
// TREE CONSTRUCTION
// =============================================================================

/// The permanent document root.
pub fn root() -> NodeId {
    DOCUMENT.with(|doc| doc.borrow().root)
}

/// Create a detached element.
pub fn create_element(tag: &str) -> NodeId {
    DOCUMENT.with(|doc| NodeId(doc.borrow_mut().nodes.insert(Node::new(tag))))
}

/// Whether the node is still alive in the arena.
pub fn exists(node: NodeId) -> bool {
    DOCUMENT.with(|doc| doc.borrow().nodes.contains(node.0))
}

/// Append `child` as the last child of `parent`, queueing a mutation
/// record. A child attached elsewhere is moved: its removal is recorded
/// against the old parent first.
pub fn append_child(parent: NodeId, child: NodeId) {
    DOCUMENT.with(|doc| {
        let mut doc = doc.borrow_mut();
        if !doc.nodes.contains(parent.0) || !doc.nodes.contains(child.0) {
            return;
        }
        // The root stays a root, and a node cannot contain itself.
        if child == doc.root || parent == child {
            return;
        }

        let probe = doc.nodes[child.0].is_probe();

        if let Some(old_parent) = doc.nodes[child.0].parent {
            doc.nodes[old_parent.0].children.retain(|&c| c != child);
            if !probe {
                doc.pending.push(MutationRecord {
                    parent: old_parent,
                    added: Vec::new(),
                    removed: vec![child],
                });
            }
        }

        doc.nodes[child.0].parent = Some(parent);
        doc.nodes[parent.0].children.push(child);

        if !probe {
            doc.pending.push(MutationRecord {
                parent,
                added: vec![child],
                removed: Vec::new(),
            });
        }
    });
}

/// Detach `child` from `parent`, queueing a mutation record.
///
/// The node stays alive in the arena, so it can be re-appended later;
/// [`destroy_node`] is the explicit reclaim.
pub fn remove_child(parent: NodeId, child: NodeId) {
    DOCUMENT.with(|doc| {
        let mut doc = doc.borrow_mut();
        if !doc.nodes.contains(parent.0) || !doc.nodes.contains(child.0) {
            return;
        }
        if doc.nodes[child.0].parent != Some(parent) {
            return;
        }

        doc.nodes[parent.0].children.retain(|&c| c != child);
        doc.nodes[child.0].parent = None;

        if !doc.nodes[child.0].is_probe() {
            doc.pending.push(MutationRecord {
                parent,
                added: Vec::new(),
                removed: vec![child],
            });
        }
    });
}

/// Free a node and its whole subtree.
///
/// Detaches silently and scrubs the freed ids out of the pending queue:
/// destruction is memory reclaim, not an observable tree mutation. Use
/// [`remove_child`] first when observers should see the node leave.
pub fn destroy_node(node: NodeId) {
    DOCUMENT.with(|doc| {
        let mut doc = doc.borrow_mut();
        if !doc.nodes.contains(node.0) || node == doc.root {
            return;
        }

        if let Some(parent) = doc.nodes[node.0].parent {
            doc.nodes[parent.0].children.retain(|&c| c != node);
        }

        let mut stack = vec![node];
        let mut freed = Vec::new();
        while let Some(id) = stack.pop() {
            if let Some(n) = doc.nodes.try_remove(id.0) {
                stack.extend(n.children);
                freed.push(id);
            }
        }

        for record in &mut doc.pending {
            record.added.retain(|id| !freed.contains(id));
            record.removed.retain(|id| !freed.contains(id));
        }
        doc.pending
            .retain(|r| !(r.added.is_empty() && r.removed.is_empty()));
    });
}

// =============================================================================
// CONTENT & STYLE
// =============================================================================

/// Visible text of a node. Empty for dead nodes.
pub fn text(node: NodeId) -> String {
    DOCUMENT.with(|doc| {
        doc.borrow()
            .nodes
            .get(node.0)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    })
}

/// Replace the visible text. Content mutation: queues no record.
pub fn set_text(node: NodeId, text: &str) {
    DOCUMENT.with(|doc| {
        if let Some(n) = doc.borrow_mut().nodes.get_mut(node.0) {
            n.text = text.to_string();
        }
    });
}

/// Read an attribute by name.
pub fn attribute(node: NodeId, name: &str) -> Option<String> {
    DOCUMENT.with(|doc| {
        doc.borrow()
            .nodes
            .get(node.0)
            .and_then(|n| n.attributes.get(name).cloned())
    })
}

/// Set an attribute. Attribute mutations are never observed.
pub fn set_attribute(node: NodeId, name: &str, value: &str) {
    DOCUMENT.with(|doc| {
        if let Some(n) = doc.borrow_mut().nodes.get_mut(node.0) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    });
}

/// Read a style property.
pub fn style(node: NodeId, property: &str) -> Option<String> {
    DOCUMENT.with(|doc| {
        doc.borrow()
            .nodes
            .get(node.0)
            .and_then(|n| n.styles.get(property).cloned())
    })
}

/// Set a style property. Content mutation: queues no record.
pub fn set_style(node: NodeId, property: &str, value: &str) {
    DOCUMENT.with(|doc| {
        if let Some(n) = doc.borrow_mut().nodes.get_mut(node.0) {
            n.styles.insert(property.to_string(), value.to_string());
        }
    });
}

// =============================================================================
// TRAVERSAL
// =============================================================================

/// Tag name of a node. Empty for dead nodes.
pub fn tag(node: NodeId) -> String {
    DOCUMENT.with(|doc| {
        doc.borrow()
            .nodes
            .get(node.0)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    })
}

/// Parent of a node, if attached.
pub fn parent(node: NodeId) -> Option<NodeId> {
    DOCUMENT.with(|doc| doc.borrow().nodes.get(node.0).and_then(|n| n.parent))
}

/// Children of a node, in document order.
pub fn children(node: NodeId) -> Vec<NodeId> {
    DOCUMENT.with(|doc| {
        doc.borrow()
            .nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    })
}

/// Whether the node is a measurement probe.
pub fn is_probe(node: NodeId) -> bool {
    DOCUMENT.with(|doc| {
        doc.borrow()
            .nodes
            .get(node.0)
            .is_some_and(|n| n.is_probe())
    })
}

/// Whether `ancestor` is `node` or one of its ancestors.
pub fn contains(ancestor: NodeId, node: NodeId) -> bool {
    DOCUMENT.with(|doc| {
        let doc = doc.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = doc.nodes.get(id.0).and_then(|n| n.parent);
        }
        false
    })
}

// =============================================================================
// SELECTOR QUERIES
// =============================================================================

/// Selector match-test for one node. Probes never match.
pub fn matches(node: NodeId, selector: &Selector) -> bool {
    DOCUMENT.with(|doc| {
        let doc = doc.borrow();
        let Some(n) = doc.nodes.get(node.0) else {
            return false;
        };
        if n.is_probe() {
            return false;
        }
        selector.matches_parts(&n.tag, &n.attributes)
    })
}

/// All elements under the document root matching `selector`, in document
/// order. The root itself is not a candidate.
pub fn query_selector_all(selector: &Selector) -> Vec<NodeId> {
    DOCUMENT.with(|doc| {
        let doc = doc.borrow();
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = doc.nodes[doc.root.0]
            .children
            .iter()
            .rev()
            .copied()
            .collect();

        while let Some(id) = stack.pop() {
            let Some(n) = doc.nodes.get(id.0) else {
                continue;
            };
            if n.is_probe() {
                continue;
            }
            if selector.matches_parts(&n.tag, &n.attributes) {
                found.push(id);
            }
            stack.extend(n.children.iter().rev().copied());
        }

        found
    })
}

// =============================================================================
// PROBES
// =============================================================================

/// Insert an invisible single-space probe as the last child of `parent`.
///
/// Probes bypass the mutation queue entirely; they exist only between this
/// call and [`remove_probe`], and nothing else may observe them.
pub fn insert_probe(parent: NodeId) -> NodeId {
    DOCUMENT.with(|doc| {
        let mut doc = doc.borrow_mut();

        let mut node = Node::new("probe");
        node.text = " ".to_string();
        node.flags = NodeFlags::PROBE | NodeFlags::HIDDEN;
        let id = NodeId(doc.nodes.insert(node));

        if doc.nodes.contains(parent.0) {
            doc.nodes[id.0].parent = Some(parent);
            doc.nodes[parent.0].children.push(id);
        }

        id
    })
}

/// Detach a probe and free its slot immediately. No-op for anything that
/// is not a probe.
pub fn remove_probe(probe: NodeId) {
    DOCUMENT.with(|doc| {
        let mut doc = doc.borrow_mut();
        let Some(node) = doc.nodes.get(probe.0) else {
            return;
        };
        if !node.is_probe() {
            return;
        }

        if let Some(parent) = node.parent {
            if let Some(p) = doc.nodes.get_mut(parent.0) {
                p.children.retain(|&c| c != probe);
            }
        }
        doc.nodes.remove(probe.0);
    });
}

// =============================================================================
// OBSERVERS
// =============================================================================

/// Subscribe to structural mutations at or below `root`.
///
/// The callback receives each delivered batch filtered to records whose
/// parent sits inside the observed subtree. Text, style, and attribute
/// changes never reach it.
pub fn observe(root: NodeId, callback: impl Fn(&[MutationRecord]) + 'static) -> ObserverHandle {
    DOCUMENT.with(|doc| {
        let mut doc = doc.borrow_mut();
        let id = doc.next_observer_id;
        doc.next_observer_id += 1;
        doc.observers.push(Observer {
            id,
            root,
            callback: Rc::new(callback),
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(observer = id, root = root.index(), "observer connected");

        ObserverHandle(id)
    })
}

/// Disconnect an observer.
pub fn unobserve(handle: ObserverHandle) {
    DOCUMENT.with(|doc| {
        doc.borrow_mut().observers.retain(|o| o.id != handle.0);
    });

    #[cfg(feature = "tracing")]
    tracing::debug!(observer = handle.0, "observer disconnected");
}

/// Number of queued, undelivered mutation records.
pub fn pending_mutation_count() -> usize {
    DOCUMENT.with(|doc| doc.borrow().pending.len())
}

/// Flush pending mutation records to observers.
///
/// The queue is drained before any callback runs; records queued while
/// callbacks execute wait for the next delivery, so re-entrant tree edits
/// cannot loop the dispatch.
pub fn deliver_mutations() {
    let (records, observers) = DOCUMENT.with(|doc| {
        let mut doc = doc.borrow_mut();
        let records = std::mem::take(&mut doc.pending);
        let observers: Vec<(NodeId, ObserverFn)> = doc
            .observers
            .iter()
            .map(|o| (o.root, o.callback.clone()))
            .collect();
        (records, observers)
    });

    if records.is_empty() {
        return;
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(records = records.len(), "delivering mutation batch");

    for (root, callback) in observers {
        let scoped: Vec<MutationRecord> = records
            .iter()
            .filter(|record| contains(root, record.parent))
            .cloned()
            .collect();
        if !scoped.is_empty() {
            callback(&scoped);
        }
    }
}

// =============================================================================
// RESET (for testing)
// =============================================================================

/// Reset the document to a fresh root with default config, dropping all
/// nodes, observers, and pending records.
pub fn reset_document() {
    DOCUMENT.with(|doc| {
        *doc.borrow_mut() = Document::new();
    });
}

// =============================================================================
// TESTS
// =============================================================================
