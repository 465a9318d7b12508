// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event vocabulary shared by the bus, the path resolver, and the detector.

use core::cell::Cell;

use kurbo::Point;
use smallvec::SmallVec;

/// Ordered chain of nodes an event passed through, innermost first.
pub type NodePath<K> = SmallVec<[K; 8]>;

/// Name of an event type, such as `pointerup`.
///
/// Event types are compared by name, so [`EventType::new`] with a custom name
/// interoperates with the predefined constants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(&'static str);

impl EventType {
    /// Pointer pressed.
    pub const POINTER_DOWN: Self = Self("pointerdown");
    /// Pointer released.
    pub const POINTER_UP: Self = Self("pointerup");
    /// Click, synthesized after a press/release pair.
    pub const CLICK: Self = Self("click");
    /// Mouse button pressed.
    pub const MOUSE_DOWN: Self = Self("mousedown");
    /// Mouse button released.
    pub const MOUSE_UP: Self = Self("mouseup");
    /// Touch point placed.
    pub const TOUCH_START: Self = Self("touchstart");
    /// Touch point lifted.
    pub const TOUCH_END: Self = Self("touchend");

    /// Create an event type from its name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The name of this event type.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0)
    }
}

/// Phase a listener is registered for.
///
/// Listeners on the shared event source run in the capture phase before the
/// event reaches its target, or in the bubble phase afterwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListenPhase {
    /// Runs before the target sees the event.
    Capture,
    /// Runs after the target saw the event.
    Bubble,
}

impl ListenPhase {
    /// Map a `capture` flag to a phase.
    pub const fn from_capture(capture: bool) -> Self {
        if capture { Self::Capture } else { Self::Bubble }
    }
}

/// Identity of a subscription slot: an event type in a given phase.
///
/// A capturing and a bubbling registration of the same handler are two
/// distinct subscriptions and must be removed with their own key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    /// Event type listened for.
    pub event_type: EventType,
    /// Phase listened in.
    pub phase: ListenPhase,
}

impl ListenerKey {
    /// Create a key.
    pub const fn new(event_type: EventType, phase: ListenPhase) -> Self {
        Self { event_type, phase }
    }
}

/// An event dispatched through an [`EventBus`](crate::bus::EventBus).
///
/// `K` is the node key of the host tree. The event carries its target, a
/// millisecond timestamp, and optionally the path the host already resolved
/// for it. When no path is attached, [`composed_path`](crate::path::composed_path)
/// computes one from the tree if the tree supports it.
#[derive(Clone, Debug)]
pub struct Event<K> {
    /// Event type.
    pub event_type: EventType,
    /// Node the event was dispatched to, if any.
    pub target: Option<K>,
    /// Milliseconds on the host clock.
    pub time_stamp: u64,
    /// Pointer position in surface coordinates, for pointer events.
    pub position: Option<Point>,
    pub(crate) native_path: Option<NodePath<K>>,
    default_prevented: Cell<bool>,
    pub(crate) in_passive_listener: Cell<bool>,
}

impl<K> Event<K> {
    /// Create an event without position or native path.
    pub fn new(event_type: EventType, target: Option<K>, time_stamp: u64) -> Self {
        Self {
            event_type,
            target,
            time_stamp,
            position: None,
            native_path: None,
            default_prevented: Cell::new(false),
            in_passive_listener: Cell::new(false),
        }
    }

    /// Attach the path the host resolved for this event, innermost first.
    pub fn with_path(mut self, path: impl IntoIterator<Item = K>) -> Self {
        self.native_path = Some(path.into_iter().collect());
        self
    }

    /// Attach a pointer position.
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// The path attached by the host, if any.
    pub fn native_path(&self) -> Option<&[K]> {
        self.native_path.as_deref()
    }

    /// Ask the host to skip its default action for this event.
    ///
    /// Ignored while a passive listener is running.
    pub fn prevent_default(&self) {
        if !self.in_passive_listener.get() {
            self.default_prevented.set(true);
        }
    }

    /// Whether a non-passive listener called [`Event::prevent_default`].
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_follows_capture_flag() {
        assert_eq!(ListenPhase::from_capture(true), ListenPhase::Capture);
        assert_eq!(ListenPhase::from_capture(false), ListenPhase::Bubble);
    }

    #[test]
    fn custom_event_type_equals_constant_with_same_name() {
        assert_eq!(EventType::new("pointerup"), EventType::POINTER_UP);
        assert_ne!(EventType::CLICK, EventType::POINTER_UP);
    }

    #[test]
    fn prevent_default_is_ignored_inside_passive_listener() {
        let ev: Event<u32> = Event::new(EventType::POINTER_UP, Some(1), 0);
        ev.in_passive_listener.set(true);
        ev.prevent_default();
        assert!(!ev.default_prevented());
        ev.in_passive_listener.set(false);
        ev.prevent_default();
        assert!(ev.default_prevented());
    }
}
