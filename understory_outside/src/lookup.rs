// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only view of the host node tree.

/// Structural and element queries the detector needs from the host tree.
///
/// Implement this for whatever tree your toolkit keeps (a widget tree, a box
/// tree, or the in-memory [`Document`](crate::dom::Document)). The detector
/// never mutates the tree and receives the lookup per dispatch, so the host
/// keeps ownership.
pub trait NodeLookup<K> {
    /// Parent of `node` in its own tree. Shadow roots have no parent.
    fn parent_of(&self, node: &K) -> Option<K>;

    /// Host element of `node` when `node` is a shadow root.
    fn shadow_host_of(&self, _node: &K) -> Option<K> {
        None
    }

    /// Whether `node` is an element (as opposed to text, a document, or a shadow root).
    fn is_element(&self, node: &K) -> bool;

    /// Whether `node` is reachable from the document through parent links
    /// alone. Nodes inside shadow trees are not.
    fn is_in_document(&self, node: &K) -> bool;

    /// Lower-case local name of an element.
    fn local_name(&self, node: &K) -> Option<&str>;

    /// The `id` of an element.
    fn element_id(&self, node: &K) -> Option<&str> {
        self.attribute(node, "id")
    }

    /// Whether an element carries `class`.
    fn has_class(&self, node: &K, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    /// Value of an attribute on an element.
    fn attribute(&self, node: &K, name: &str) -> Option<&str>;

    /// Whether paths can be computed from the tree when an event carries none.
    ///
    /// Older engines expose neither a native path nor a way to compute one;
    /// returning `false` sends the detector down its containment fallback.
    fn supports_composed_path(&self) -> bool {
        true
    }
}
