// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory node tree with elements, text, and shadow roots.
//!
//! [`Document`] is a small arena for hosts that do not keep a tree of their
//! own, and for tests. It implements [`NodeLookup`] so it can be handed to
//! [`EventBus::dispatch`](crate::bus::EventBus::dispatch) directly.
//!
//! ```
//! use understory_outside::dom::{Document, NodeKind};
//!
//! let mut doc = Document::new();
//! let menu = doc.create_element("div");
//! doc.add_class(menu, "menu");
//! assert!(doc.append_child(doc.root(), menu));
//!
//! let shadow = doc.attach_shadow(menu).unwrap();
//! assert_eq!(doc.kind(shadow), Some(NodeKind::ShadowRoot));
//! assert_eq!(doc.shadow_root_of(menu), Some(shadow));
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::lookup::NodeLookup;
use crate::selector::Selector;

/// Identifier of a node in a [`Document`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    const fn idx(self) -> usize {
        self.0
    }
}

/// Kind of a [`Document`] node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root.
    Document,
    /// An element with a local name and attributes.
    Element,
    /// A text node.
    Text,
    /// Root of a shadow tree attached to a host element.
    ShadowRoot,
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Host element, for shadow roots.
    host: Option<NodeId>,
    /// Attached shadow root, for hosts.
    shadow_root: Option<NodeId>,
    local_name: String,
    attributes: Vec<(String, String)>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            host: None,
            shadow_root: None,
            local_name: String::new(),
            attributes: Vec::new(),
        }
    }
}

/// Arena-backed node tree.
///
/// Nodes are never freed; detached nodes stay addressable so that events
/// targeting them can still be evaluated.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    composed_path: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only its root node.
    pub fn new() -> Self {
        Self {
            nodes: alloc::vec![Node::new(NodeKind::Document)],
            composed_path: true,
        }
    }

    /// Choose whether paths can be computed for events without a native path.
    ///
    /// Disabling this models engines without composed path support.
    pub fn with_composed_path_support(mut self, supported: bool) -> Self {
        self.composed_path = supported;
        self
    }

    /// The document root.
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.idx())
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Create a detached element. The name is stored lower-case.
    pub fn create_element(&mut self, local_name: &str) -> NodeId {
        let mut node = Node::new(NodeKind::Element);
        node.local_name = local_name.to_ascii_lowercase();
        self.push(node)
    }

    /// Create a detached text node.
    pub fn create_text(&mut self) -> NodeId {
        self.push(Node::new(NodeKind::Text))
    }

    /// Kind of a node, or `None` for an unknown id.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// Children of a node in tree order.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    ///
    /// Returns `false` and leaves the tree unchanged when the insertion is
    /// not allowed: unknown ids, a document or shadow root as `child`, a text
    /// node as `parent`, or `child` being an inclusive ancestor of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let (Some(p), Some(c)) = (self.node(parent), self.node(child)) else {
            return false;
        };
        if matches!(c.kind, NodeKind::Document | NodeKind::ShadowRoot)
            || p.kind == NodeKind::Text
        {
            return false;
        }
        let mut cur = Some(parent);
        while let Some(n) = cur {
            if n == child {
                return false;
            }
            cur = self.parent_of(&n).or_else(|| self.shadow_host_of(&n));
        }
        self.detach(child);
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        true
    }

    /// Remove a node from its parent. The subtree stays intact but disconnected.
    ///
    /// Returns `false` if the node had no parent.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.node_mut(id).and_then(|n| n.parent.take()) else {
            return false;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        true
    }

    /// Attach a shadow root to an element.
    ///
    /// Returns `None` if `host` is not an element or already has one.
    pub fn attach_shadow(&mut self, host: NodeId) -> Option<NodeId> {
        let h = self.node(host)?;
        if h.kind != NodeKind::Element || h.shadow_root.is_some() {
            return None;
        }
        let mut root = Node::new(NodeKind::ShadowRoot);
        root.host = Some(host);
        let id = self.push(root);
        if let Some(h) = self.node_mut(host) {
            h.shadow_root = Some(id);
        }
        Some(id)
    }

    /// The shadow root attached to `host`, if any.
    pub fn shadow_root_of(&self, host: NodeId) -> Option<NodeId> {
        self.node(host).and_then(|n| n.shadow_root)
    }

    /// Set an attribute on an element, replacing any previous value.
    ///
    /// Returns `false` if `id` is not an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.kind != NodeKind::Element {
            return false;
        }
        let name = name.to_ascii_lowercase();
        match node.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => {
                v.clear();
                v.push_str(value);
            }
            None => node.attributes.push((name, value.into())),
        }
        true
    }

    /// Set the `id` attribute.
    pub fn set_id(&mut self, id: NodeId, value: &str) -> bool {
        self.set_attribute(id, "id", value)
    }

    /// Add a class to the `class` attribute if not already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        if !self.is_element(&id) {
            return false;
        }
        if self.has_class(&id, class) {
            return true;
        }
        let mut list: String = self.attribute(&id, "class").unwrap_or_default().into();
        if !list.is_empty() {
            list.push(' ');
        }
        list.push_str(class);
        self.set_attribute(id, "class", &list)
    }

    /// First element in tree order below the document root matching `selector`.
    ///
    /// Like a light-tree query, this does not descend into shadow trees.
    pub fn query(&self, selector: &Selector) -> Option<NodeId> {
        self.query_in(self.root(), selector)
    }

    /// First element in tree order below `scope` matching `selector`.
    ///
    /// `scope` itself is not a candidate. Pass a shadow root to search inside
    /// a shadow tree.
    pub fn query_in(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children_of(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if selector.matches(self, &id) {
                return Some(id);
            }
            stack.extend(self.children_of(id).iter().rev());
        }
        None
    }

    /// Whether `node` is `ancestor` or a light-tree descendant of it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        crate::matcher::contains(self, &ancestor, &node)
    }
}

impl NodeLookup<NodeId> for Document {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).and_then(|n| n.parent)
    }

    fn shadow_host_of(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).and_then(|n| n.host)
    }

    fn is_element(&self, node: &NodeId) -> bool {
        self.kind(*node) == Some(NodeKind::Element)
    }

    fn is_in_document(&self, node: &NodeId) -> bool {
        let mut cur = *node;
        loop {
            if cur == self.root() {
                return true;
            }
            match self.parent_of(&cur) {
                Some(next) => cur = next,
                None => return false,
            }
        }
    }

    fn local_name(&self, node: &NodeId) -> Option<&str> {
        self.node(*node)
            .filter(|n| n.kind == NodeKind::Element)
            .map(|n| n.local_name.as_str())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<&str> {
        self.node(*node)?
            .attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn supports_composed_path(&self) -> bool {
        self.composed_path
    }
}
