// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Containment and selector matching over a [`NodeLookup`].
//!
//! These helpers accept missing nodes and answer `false`/`None` for them, so
//! callers can pass an event target straight through.

use crate::lookup::NodeLookup;
use crate::selector::Selector;

/// Whether `node` is an element matching `selector`.
pub fn matches<K, L>(lookup: &L, node: Option<&K>, selector: &Selector) -> bool
where
    L: NodeLookup<K> + ?Sized,
{
    node.is_some_and(|n| selector.matches(lookup, n))
}

/// `node` itself or its nearest ancestor matching `selector`.
///
/// Walks parent links only, so the search stops at a shadow root rather than
/// continuing into the host's tree.
pub fn closest<K, L>(lookup: &L, node: Option<K>, selector: &Selector) -> Option<K>
where
    L: NodeLookup<K> + ?Sized,
{
    let mut cur = node;
    while let Some(n) = cur {
        if selector.matches(lookup, &n) {
            return Some(n);
        }
        cur = lookup.parent_of(&n);
    }
    None
}

/// Whether `node` is `ancestor` or one of its descendants in the same tree.
pub fn contains<K, L>(lookup: &L, ancestor: &K, node: &K) -> bool
where
    K: PartialEq,
    L: NodeLookup<K> + ?Sized,
{
    if ancestor == node {
        return true;
    }
    let mut cur = lookup.parent_of(node);
    while let Some(n) = cur {
        if n == *ancestor {
            return true;
        }
        cur = lookup.parent_of(&n);
    }
    false
}

/// Whether `node` is missing or outside the document's light tree.
///
/// Nodes inside shadow trees count as detached: without a composed path
/// their relation to a light-tree node cannot be established.
pub fn is_detached<K, L>(lookup: &L, node: Option<&K>) -> bool
where
    L: NodeLookup<K> + ?Sized,
{
    node.is_none_or(|n| !lookup.is_in_document(n))
}
