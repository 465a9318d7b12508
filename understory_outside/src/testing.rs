// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::bus::EventBus;
use crate::dom::{Document, NodeId};
use crate::selector::Selector;
use crate::types::{Event, EventType};

/// A document plus a bus whose clock ticks once per dispatched event.
pub(crate) struct Fixture {
    pub(crate) doc: Document,
    pub(crate) bus: Rc<EventBus<NodeId>>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            doc: Document::new(),
            bus: Rc::new(EventBus::new()),
        }
    }

    /// A document that cannot compute composed paths.
    pub(crate) fn legacy() -> Self {
        Self {
            doc: Document::new().with_composed_path_support(false),
            bus: Rc::new(EventBus::new()),
        }
    }

    /// Append one `div` per class to the document root.
    pub(crate) fn render(&mut self, classes: &[&str]) -> Vec<NodeId> {
        classes
            .iter()
            .map(|class| {
                let node = self.doc.create_element("div");
                self.doc.add_class(node, class);
                self.doc.append_child(self.doc.root(), node);
                node
            })
            .collect()
    }

    pub(crate) fn q(&self, selector: &str) -> NodeId {
        let selector = Selector::parse(selector).unwrap();
        self.doc.query(&selector).unwrap()
    }

    pub(crate) fn trigger(&self, node: NodeId, event_type: EventType) -> bool {
        self.bus.advance(1);
        let event = self.bus.event(event_type, Some(node));
        self.bus.dispatch(&event, &self.doc)
    }

    pub(crate) fn gesture(&self, press: NodeId, release: NodeId) {
        self.trigger(press, EventType::POINTER_DOWN);
        self.trigger(release, EventType::POINTER_UP);
    }

    pub(crate) fn click_with_pointer(&self, node: NodeId) {
        self.gesture(node, node);
    }
}

/// A call counter and an action that bumps it.
pub(crate) fn counter() -> (Rc<Cell<usize>>, impl Fn(&Event<NodeId>) + 'static) {
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    (calls, move |_: &Event<NodeId>| c.set(c.get() + 1))
}
