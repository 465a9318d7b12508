// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composed path resolution.
//!
//! The composed path is the chain of nodes an event travels through,
//! including the hosts of any shadow trees it crosses. Only membership is
//! consulted by the detector, but the order is stable: innermost first.

use crate::lookup::NodeLookup;
use crate::types::{Event, NodePath};

/// Resolve the composed path of `event`.
///
/// Uses the path the host attached to the event when present. Otherwise,
/// if `lookup` supports it, walks from the event target through parents and
/// from each shadow root to its host. Returns `None` when neither source is
/// available, or when a path has to be computed for an event without target.
///
/// ```
/// use understory_outside::dom::Document;
/// use understory_outside::path::composed_path;
/// use understory_outside::types::{Event, EventType};
///
/// let mut doc = Document::new();
/// let host = doc.create_element("x-menu");
/// doc.append_child(doc.root(), host);
/// let shadow = doc.attach_shadow(host).unwrap();
/// let button = doc.create_element("button");
/// doc.append_child(shadow, button);
///
/// let ev = Event::new(EventType::POINTER_UP, Some(button), 0);
/// let path = composed_path(&ev, &doc).unwrap();
/// assert_eq!(path.as_slice(), &[button, shadow, host, doc.root()]);
/// ```
pub fn composed_path<K, L>(event: &Event<K>, lookup: &L) -> Option<NodePath<K>>
where
    K: Clone,
    L: NodeLookup<K> + ?Sized,
{
    if let Some(path) = &event.native_path {
        return Some(path.clone());
    }
    if !lookup.supports_composed_path() {
        return None;
    }
    let mut path = NodePath::new();
    let mut cur = event.target.clone();
    while let Some(node) = cur {
        cur = lookup
            .parent_of(&node)
            .or_else(|| lookup.shadow_host_of(&node));
        path.push(node);
    }
    if path.is_empty() { None } else { Some(path) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::types::EventType;

    #[test]
    fn native_path_wins_over_computation() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        doc.append_child(doc.root(), a);
        let ev = Event::new(EventType::POINTER_UP, Some(a), 0).with_path([a]);
        let path = composed_path(&ev, &doc).unwrap();
        assert_eq!(path.as_slice(), &[a]);

        // Even an engine that cannot compute paths reports a native one.
        let legacy = doc.clone().with_composed_path_support(false);
        assert_eq!(composed_path(&ev, &legacy).unwrap().as_slice(), &[a]);
    }

    #[test]
    fn unavailable_without_support_or_target() {
        let mut doc = Document::new().with_composed_path_support(false);
        let a = doc.create_element("div");
        doc.append_child(doc.root(), a);
        let ev = Event::new(EventType::POINTER_UP, Some(a), 0);
        assert!(composed_path(&ev, &doc).is_none());

        let doc = Document::new();
        let ev: Event<crate::dom::NodeId> = Event::new(EventType::POINTER_UP, None, 0);
        assert!(composed_path(&ev, &doc).is_none());
    }

    #[test]
    fn detached_target_path_ends_at_subtree_root() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("span");
        doc.append_child(a, b);
        let ev = Event::new(EventType::POINTER_UP, Some(b), 0);
        assert_eq!(composed_path(&ev, &doc).unwrap().as_slice(), &[b, a]);
    }
}
