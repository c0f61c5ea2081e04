//! Node model shared by the search engine, the traversal utilities and the
//! HTTP layer.
//!
//! The engine only needs the [`TreeNode`] capability: a name and an ordered
//! slice of children. [`Node`] is the owned implementation used everywhere
//! else in the crate. Each node exclusively owns its children, so the tree
//! is acyclic by construction and has no back-references.
//!
//! The name is fixed when the node is built. There is no setter; a tree is
//! assembled bottom-up with [`Node::with_children`] or [`Node::child`].
//!
//! On the wire a node is `{ "name": "...", "children": [ ... ] }`. Both keys
//! are optional when reading (empty name, no children), unknown keys are
//! ignored, and both keys are always written.

use serde::{Deserialize, Serialize};

/// Capability required by the search engine and the traversal utilities.
///
/// `Sync` is required because the engine hands `&Self` to pool workers.
pub trait TreeNode: Sync + Sized {
    /// The node's name, possibly empty
    fn name(&self) -> &str;

    /// The node's children in insertion order
    fn children(&self) -> &[Self];
}

/// A named node owning an ordered list of children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    name: String,
    #[serde(default)]
    children: Vec<Node>,
}

impl Node {
    /// Creates a leaf node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Creates a node with the given children
    pub fn with_children(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    /// Appends a child, consuming and returning the node for chaining
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }
}

impl TreeNode for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}
