// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared, single-threaded listener registry.
//!
//! [`EventBus`] stands in for the document-level listener list: every
//! detector subscribes to the same bus, keyed by [`ListenerKey`] (event type
//! and phase), and the host feeds input through [`EventBus::dispatch`].
//!
//! ## Semantics
//!
//! - Capture listeners for the event type run first, then bubble listeners,
//!   each in registration order.
//! - A listener removed while a dispatch is in progress is not invoked
//!   afterwards, even if it was registered when the dispatch started.
//! - Removal must name the same phase as the registration. Removing with the
//!   other phase is a no-op.
//! - Passive listeners cannot prevent the default action.
//! - No borrow is held while a handler runs, so handlers may subscribe,
//!   unsubscribe, or dispatch re-entrantly.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_outside::bus::{AddListenerOptions, EventBus};
//! use understory_outside::dom::Document;
//! use understory_outside::types::EventType;
//!
//! let doc = Document::new();
//! let bus = EventBus::new();
//! let seen = Rc::new(Cell::new(0));
//! let counter = seen.clone();
//! let sub = bus.subscribe(EventType::CLICK, &AddListenerOptions::default(), move |_, _| {
//!     counter.set(counter.get() + 1);
//! });
//!
//! bus.dispatch(&bus.event(EventType::CLICK, Some(doc.root())), &doc);
//! assert_eq!(seen.get(), 1);
//!
//! assert!(bus.unsubscribe(sub.key, sub.id));
//! bus.dispatch(&bus.event(EventType::CLICK, Some(doc.root())), &doc);
//! assert_eq!(seen.get(), 1);
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use hashbrown::HashMap;

use crate::lookup::NodeLookup;
use crate::types::{Event, EventType, ListenPhase, ListenerKey};

bitflags::bitflags! {
    /// Options a listener was registered with, as honored by the bus.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ListenerFlags: u8 {
        /// Registered for the capture phase.
        const CAPTURE = 0b0000_0001;
        /// Registered as passive; cannot prevent the default action.
        const PASSIVE = 0b0000_0010;
    }
}

/// Options read by [`EventBus::subscribe`].
///
/// The bus reads `passive` only when it honors passive listeners, which is
/// what [`probe_passive`](crate::passive::probe_passive) observes.
pub trait ListenerOptions {
    /// Register for the capture phase.
    fn capture(&self) -> bool;
    /// Request passive semantics.
    fn passive(&self) -> bool;
}

/// Plain listener options.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AddListenerOptions {
    /// Register for the capture phase.
    pub capture: bool,
    /// Request passive semantics.
    pub passive: bool,
}

impl ListenerOptions for AddListenerOptions {
    fn capture(&self) -> bool {
        self.capture
    }

    fn passive(&self) -> bool {
        self.passive
    }
}

/// Identifier of a single registration on an [`EventBus`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A registration: the slot it lives in and its identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    /// Event type and phase.
    pub key: ListenerKey,
    /// Identifier within the bus.
    pub id: ListenerId,
    /// Options as honored at registration.
    pub flags: ListenerFlags,
}

/// Listener callback. Receives the event and the host tree.
pub type Handler<K> = Rc<dyn Fn(&Event<K>, &dyn NodeLookup<K>)>;

struct Entry<K> {
    id: ListenerId,
    flags: ListenerFlags,
    handler: Handler<K>,
}

/// Shared listener registry with a host-driven clock.
pub struct EventBus<K> {
    listeners: RefCell<HashMap<ListenerKey, Vec<Entry<K>>>>,
    next_id: Cell<u64>,
    honors_passive: bool,
    now: Cell<u64>,
}

impl<K> core::fmt::Debug for EventBus<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("honors_passive", &self.honors_passive)
            .field("now", &self.now.get())
            .finish_non_exhaustive()
    }
}

impl<K> Default for EventBus<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EventBus<K> {
    /// Create an empty bus that honors passive listeners, with the clock at zero.
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            honors_passive: true,
            now: Cell::new(0),
        }
    }

    /// Choose whether passive registration is honored.
    ///
    /// When `false` the bus never reads the `passive` option, like engines
    /// that predate passive listeners.
    pub fn with_passive_support(mut self, honored: bool) -> Self {
        self.honors_passive = honored;
        self
    }

    /// Current host time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Set the host time in milliseconds.
    pub fn set_now(&self, ms: u64) {
        self.now.set(ms);
    }

    /// Advance the host time and return the new value.
    pub fn advance(&self, ms: u64) -> u64 {
        let t = self.now.get().saturating_add(ms);
        self.now.set(t);
        t
    }

    /// Create an event stamped with the current host time.
    pub fn event(&self, event_type: EventType, target: Option<K>) -> Event<K> {
        Event::new(event_type, target, self.now())
    }

    /// Register `handler` for `event_type`.
    pub fn subscribe(
        &self,
        event_type: EventType,
        options: &dyn ListenerOptions,
        handler: impl Fn(&Event<K>, &dyn NodeLookup<K>) + 'static,
    ) -> Subscription {
        let mut flags = ListenerFlags::empty();
        if options.capture() {
            flags |= ListenerFlags::CAPTURE;
        }
        if self.honors_passive && options.passive() {
            flags |= ListenerFlags::PASSIVE;
        }
        let key = ListenerKey::new(
            event_type,
            ListenPhase::from_capture(flags.contains(ListenerFlags::CAPTURE)),
        );
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(Entry {
                id,
                flags,
                handler: Rc::new(handler),
            });
        tracing::debug!(event_type = %event_type, phase = ?key.phase, id = id.0, ?flags, "subscribed");
        Subscription { key, id, flags }
    }

    /// Remove the registration `id` from `key`.
    ///
    /// Returns `false` if nothing was registered under that exact key and id.
    pub fn unsubscribe(&self, key: ListenerKey, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(&key) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(&key);
        }
        if removed {
            tracing::debug!(event_type = %key.event_type, phase = ?key.phase, id = id.0, "unsubscribed");
        }
        removed
    }

    /// Whether `id` is currently registered under `key`.
    pub fn has_listener(&self, key: ListenerKey, id: ListenerId) -> bool {
        self.listeners
            .borrow()
            .get(&key)
            .is_some_and(|entries| entries.iter().any(|e| e.id == id))
    }

    /// Number of registrations under `key`.
    pub fn listeners_for(&self, key: ListenerKey) -> usize {
        self.listeners.borrow().get(&key).map_or(0, Vec::len)
    }

    /// Total number of registrations.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum()
    }

    /// Deliver `event` to its listeners.
    ///
    /// Returns `false` if a non-passive listener prevented the default action.
    pub fn dispatch(&self, event: &Event<K>, lookup: &dyn NodeLookup<K>) -> bool {
        for phase in [ListenPhase::Capture, ListenPhase::Bubble] {
            let key = ListenerKey::new(event.event_type, phase);
            let snapshot: Vec<(ListenerId, ListenerFlags, Handler<K>)> = match self
                .listeners
                .borrow()
                .get(&key)
            {
                Some(entries) => entries
                    .iter()
                    .map(|e| (e.id, e.flags, e.handler.clone()))
                    .collect(),
                None => continue,
            };
            for (id, flags, handler) in snapshot {
                if !self.has_listener(key, id) {
                    continue;
                }
                event
                    .in_passive_listener
                    .set(flags.contains(ListenerFlags::PASSIVE));
                handler(event, lookup);
                event.in_passive_listener.set(false);
            }
        }
        !event.default_prevented()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, NodeId};
    use alloc::vec;

    fn opts(capture: bool, passive: bool) -> AddListenerOptions {
        AddListenerOptions { capture, passive }
    }

    #[test]
    fn capture_runs_before_bubble_in_registration_order() {
        let doc = Document::new();
        let bus: EventBus<NodeId> = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, capture) in [("b1", false), ("c1", true), ("b2", false), ("c2", true)] {
            let log = log.clone();
            bus.subscribe(EventType::POINTER_UP, &opts(capture, false), move |_, _| {
                log.borrow_mut().push(name);
            });
        }
        bus.dispatch(&bus.event(EventType::POINTER_UP, Some(doc.root())), &doc);
        assert_eq!(*log.borrow(), vec!["c1", "c2", "b1", "b2"]);
    }

    #[test]
    fn other_event_types_are_not_delivered() {
        let doc = Document::new();
        let bus: EventBus<NodeId> = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bus.subscribe(EventType::POINTER_UP, &opts(false, false), move |_, _| {
            h.set(h.get() + 1);
        });
        bus.dispatch(&bus.event(EventType::CLICK, None), &doc);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn removal_must_match_phase() {
        let bus: EventBus<NodeId> = EventBus::new();
        let sub = bus.subscribe(EventType::POINTER_UP, &opts(true, false), |_, _| {});
        assert_eq!(sub.key.phase, ListenPhase::Capture);
        let wrong = ListenerKey::new(EventType::POINTER_UP, ListenPhase::Bubble);
        assert!(!bus.unsubscribe(wrong, sub.id));
        assert!(bus.has_listener(sub.key, sub.id));
        assert_eq!(bus.listeners_for(sub.key), 1);
        assert_eq!(bus.listeners_for(wrong), 0);
        assert!(bus.unsubscribe(sub.key, sub.id));
        assert!(!bus.unsubscribe(sub.key, sub.id));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let doc = Document::new();
        let bus: Rc<EventBus<NodeId>> = Rc::new(EventBus::new());
        let second_ran = Rc::new(Cell::new(false));
        let victim: Rc<Cell<Option<Subscription>>> = Rc::new(Cell::new(None));

        let (b, v) = (bus.clone(), victim.clone());
        bus.subscribe(EventType::CLICK, &opts(false, false), move |_, _| {
            if let Some(sub) = v.get() {
                b.unsubscribe(sub.key, sub.id);
            }
        });
        let ran = second_ran.clone();
        let sub = bus.subscribe(EventType::CLICK, &opts(false, false), move |_, _| {
            ran.set(true);
        });
        victim.set(Some(sub));

        bus.dispatch(&bus.event(EventType::CLICK, None), &doc);
        assert!(!second_ran.get());
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn passive_listeners_cannot_prevent_default() {
        let doc = Document::new();
        let bus: EventBus<NodeId> = EventBus::new();
        let sub = bus.subscribe(EventType::TOUCH_START, &opts(false, true), |e, _| {
            e.prevent_default();
        });
        assert!(sub.flags.contains(ListenerFlags::PASSIVE));
        assert!(bus.dispatch(&bus.event(EventType::TOUCH_START, None), &doc));

        bus.subscribe(EventType::TOUCH_START, &opts(false, false), |e, _| {
            e.prevent_default();
        });
        assert!(!bus.dispatch(&bus.event(EventType::TOUCH_START, None), &doc));
    }

    #[test]
    fn passive_hint_is_dropped_when_unsupported() {
        let bus: EventBus<NodeId> = EventBus::new().with_passive_support(false);
        let sub = bus.subscribe(EventType::TOUCH_START, &opts(false, true), |_, _| {});
        assert!(!sub.flags.contains(ListenerFlags::PASSIVE));
    }

    #[test]
    fn clock_stamps_events() {
        let bus: EventBus<NodeId> = EventBus::new();
        assert_eq!(bus.event(EventType::CLICK, None).time_stamp, 0);
        assert_eq!(bus.advance(16), 16);
        bus.set_now(100);
        assert_eq!(bus.event(EventType::CLICK, None).time_stamp, 100);
    }
}
