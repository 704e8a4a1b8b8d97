//! Arena-based node tree.
//!
//! Every node lives in one vector and refers to its parent and siblings by
//! [`NodeId`]. A parent owns its children through the arena; the parent,
//! sibling and child links are plain indices used only for traversal.

use std::ops::Index;

use whtml_lexer::{Attribute, Position};

/// A type-safe index into a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The implicit root is always at index 0. It collects the top-level
    /// nodes and never appears in parse output.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Node classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeKind {
    /// Unset. Only the implicit root carries it.
    #[default]
    Error,
    /// Decoded text.
    Text(String),
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    /// A standalone `{{expression}}`, kept raw.
    Mustache(String),
}

/// A node and its links.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
    /// `prefix` of a `prefix:local` element name.
    pub namespace: Option<String>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Node {
    /// A detached node.
    pub fn new(kind: NodeKind, position: Position) -> Self {
        Self {
            kind,
            position,
            namespace: None,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    /// A detached element, with its namespace taken from a `prefix:` name.
    pub fn element(name: String, attributes: Vec<Attribute>, position: Position) -> Self {
        let namespace = name.split_once(':').map(|(prefix, _)| prefix.to_string());
        let mut node = Self::new(NodeKind::Element { name, attributes }, position);
        node.namespace = namespace;
        node
    }

    /// Element name, or `None` for other nodes.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Element attributes; empty for other nodes.
    pub fn attributes(&self) -> &[Attribute] {
        match &self.kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Whether the node already has a parent or a sibling.
    pub fn is_attached(&self) -> bool {
        self.parent.is_some() || self.prev_sibling.is_some() || self.next_sibling.is_some()
    }
}

/// Arena tree with O(1) append and navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// The implicit root is always at index 0 (NodeId::ROOT).
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only the implicit root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Error, Position::default())],
        }
    }

    /// Store a node and return its ID. The node is not attached yet.
    ///
    /// Any links already set on `node` are discarded.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(node.kind, node.position));
        self.nodes[id.0].namespace = node.namespace;
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent or siblings, if it is the root,
    /// or if it is `parent` itself. Nodes are never moved once placed. Debug
    /// builds also panic when `parent` sits inside `child`'s subtree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        assert_ne!(child, NodeId::ROOT, "append_child called with the root as child");
        assert_ne!(parent, child, "append_child called with a node as its own child");
        assert!(
            !self.nodes[child.0].is_attached(),
            "append_child called for an attached child node"
        );
        debug_assert!(
            !self.is_ancestor(child, parent),
            "append_child called with a descendant of the child as parent"
        );

        let last = self.nodes[parent.0].last_child;
        match last {
            Some(last) => self.nodes[last.0].next_sibling = Some(child),
            None => self.nodes[parent.0].first_child = Some(child),
        }
        self.nodes[parent.0].last_child = Some(child);

        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.prev_sibling = last;
    }

    /// Whether `ancestor` is `id` or lies on its parent chain.
    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes[id.0].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Mutable access to a node's data. Links stay under the tree's control.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Children of `id`, first to last.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(Node::first_child),
        }
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

/// Iterator over a node's children, following next-sibling links.
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree[id].next_sibling;
        Some(id)
    }
}
