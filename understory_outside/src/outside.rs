// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outside-interaction detection.
//!
//! [`Outside`] watches an [`EventBus`] and calls an action when a gesture
//! starts and ends outside a target node. Menus, popovers, and modals use it
//! to close themselves when the user interacts elsewhere.
//!
//! ## Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_outside::bus::EventBus;
//! use understory_outside::dom::Document;
//! use understory_outside::outside::{Outside, OutsideOptions};
//! use understory_outside::types::EventType;
//!
//! let mut doc = Document::new();
//! let menu = doc.create_element("div");
//! let page = doc.create_element("div");
//! doc.append_child(doc.root(), menu);
//! doc.append_child(doc.root(), page);
//!
//! let bus = Rc::new(EventBus::new());
//! let closed = Rc::new(Cell::new(0));
//! let c = closed.clone();
//! let outside = Outside::new(&bus, menu, move |_| c.set(c.get() + 1), OutsideOptions::new());
//!
//! // A gesture on the page closes the menu.
//! bus.dispatch(&bus.event(EventType::POINTER_DOWN, Some(page)), &doc);
//! bus.dispatch(&bus.event(EventType::POINTER_UP, Some(page)), &doc);
//! assert_eq!(closed.get(), 1);
//!
//! // A gesture inside the menu does not.
//! bus.dispatch(&bus.event(EventType::POINTER_DOWN, Some(menu)), &doc);
//! bus.dispatch(&bus.event(EventType::POINTER_UP, Some(menu)), &doc);
//! assert_eq!(closed.get(), 1);
//!
//! outside.destroy();
//! assert_eq!(bus.listener_count(), 0);
//! ```
//!
//! ## Decision rules
//!
//! Every press event records its composed path, whether or not the detector
//! is active. On each release event the first matching rule wins:
//!
//! 1. Inactive: suppressed.
//! 2. `ignore_initial_trigger` and the release is not newer than the
//!    detector: suppressed. This drops the release of the gesture that
//!    opened the component.
//! 3. The last press path contains the target: suppressed. Where a gesture
//!    that started inside ends does not matter.
//! 4. The release target or one of its ancestors matches the exception
//!    selector: suppressed.
//! 5. The release path is resolved:
//!    - with a path, the action fires iff the target is not on it;
//!    - without one, a release target that is missing, detached, or inside
//!      a shadow tree is suppressed because its relation to the target is
//!      unknown, a release target inside the target is suppressed, and
//!      anything else fires.
//!
//! Each configured release type runs these rules on its own. If two of them
//! are dispatched for one gesture, the action can fire twice.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use smallvec::SmallVec;

use crate::bus::{AddListenerOptions, EventBus, Subscription};
use crate::lookup::NodeLookup;
use crate::matcher;
use crate::passive::supports_passive;
use crate::path::composed_path;
use crate::selector::{Selector, SelectorError};
use crate::types::{Event, EventType, NodePath};

/// Configuration for an [`Outside`] detector, fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutsideOptions {
    active: bool,
    except_selector: Option<Selector>,
    event_types: SmallVec<[EventType; 2]>,
    capture: bool,
    passive: bool,
    ignore_initial_trigger: bool,
    press_type: Option<EventType>,
}

impl Default for OutsideOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OutsideOptions {
    /// Defaults: active, releases on `pointerup` in the bubble phase, passive,
    /// presses tracked on `pointerdown`, no exception selector.
    pub fn new() -> Self {
        Self {
            active: true,
            except_selector: None,
            event_types: SmallVec::from_slice(&[EventType::POINTER_UP]),
            capture: false,
            passive: true,
            ignore_initial_trigger: false,
            press_type: Some(EventType::POINTER_DOWN),
        }
    }

    /// Click-based configuration: releases on `click`, no press tracking, not
    /// passive.
    pub fn compat() -> Self {
        Self::new()
            .with_event_types([EventType::CLICK])
            .with_press_type(None)
            .with_passive(false)
    }

    /// Start active or inactive.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Parse and set the exception selector.
    pub fn with_except_selector(self, selector: &str) -> Result<Self, SelectorError> {
        Ok(self.with_selector(Selector::parse(selector)?))
    }

    /// Set an already parsed exception selector.
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.except_selector = Some(selector);
        self
    }

    /// Set the release event types. Duplicates are dropped, order is kept.
    pub fn with_event_types(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.event_types.clear();
        for ty in types {
            if !self.event_types.contains(&ty) {
                self.event_types.push(ty);
            }
        }
        self
    }

    /// Listen for releases in the capture phase.
    pub fn with_capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    /// Request passive release listeners. Ignored where unsupported.
    pub fn with_passive(mut self, passive: bool) -> Self {
        self.passive = passive;
        self
    }

    /// Suppress releases stamped at or before construction time.
    pub fn with_ignore_initial_trigger(mut self, ignore: bool) -> Self {
        self.ignore_initial_trigger = ignore;
        self
    }

    /// Event type recorded as the press of a gesture, or `None` to not track presses.
    pub fn with_press_type(mut self, press_type: Option<EventType>) -> Self {
        self.press_type = press_type;
        self
    }

    /// Whether the detector starts active.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Exception selector, if any.
    pub fn except_selector(&self) -> Option<&Selector> {
        self.except_selector.as_ref()
    }

    /// Release event types.
    pub fn event_types(&self) -> &[EventType] {
        &self.event_types
    }

    /// Whether releases are observed in the capture phase.
    pub fn capture(&self) -> bool {
        self.capture
    }

    /// Whether passive release listeners are requested.
    pub fn passive(&self) -> bool {
        self.passive
    }

    /// Whether the initial trigger is ignored.
    pub fn ignore_initial_trigger(&self) -> bool {
        self.ignore_initial_trigger
    }

    /// Tracked press type.
    pub fn press_type(&self) -> Option<EventType> {
        self.press_type
    }
}

/// Why a release did not fire the action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Suppression {
    /// The detector is deactivated.
    Inactive,
    /// The release is not newer than the detector.
    InitialTrigger,
    /// The gesture was pressed inside the target.
    PressedInside,
    /// The release target or an ancestor matches the exception selector.
    ExceptSelector,
    /// The release happened on or inside the target.
    ReleasedInside,
    /// No path is available and the release target is missing or outside
    /// the document's light tree.
    Detached,
}

/// Outcome of evaluating a release event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The gesture is outside; the action runs.
    Fire,
    /// The action does not run.
    Suppress(Suppression),
}

struct State<K> {
    target: K,
    action: Box<dyn Fn(&Event<K>)>,
    except_selector: Option<Selector>,
    active: Cell<bool>,
    reference_mark: Option<u64>,
    press_path: RefCell<Option<NodePath<K>>>,
}

impl<K: Clone + PartialEq> State<K> {
    fn record_press<L>(&self, event: &Event<K>, lookup: &L)
    where
        L: NodeLookup<K> + ?Sized,
    {
        *self.press_path.borrow_mut() = composed_path(event, lookup);
    }

    fn decide<L>(&self, event: &Event<K>, lookup: &L) -> Decision
    where
        L: NodeLookup<K> + ?Sized,
    {
        if !self.active.get() {
            return Decision::Suppress(Suppression::Inactive);
        }
        if let Some(mark) = self.reference_mark
            && event.time_stamp <= mark
        {
            return Decision::Suppress(Suppression::InitialTrigger);
        }
        if self
            .press_path
            .borrow()
            .as_ref()
            .is_some_and(|path| path.contains(&self.target))
        {
            return Decision::Suppress(Suppression::PressedInside);
        }
        if let Some(selector) = &self.except_selector
            && matcher::closest(lookup, event.target.clone(), selector).is_some()
        {
            return Decision::Suppress(Suppression::ExceptSelector);
        }
        match composed_path(event, lookup) {
            Some(path) if path.contains(&self.target) => {
                Decision::Suppress(Suppression::ReleasedInside)
            }
            Some(_) => Decision::Fire,
            None => {
                let Some(released) = event.target.as_ref() else {
                    return Decision::Suppress(Suppression::Detached);
                };
                if matcher::is_detached(lookup, Some(released)) {
                    Decision::Suppress(Suppression::Detached)
                } else if matcher::contains(lookup, &self.target, released) {
                    Decision::Suppress(Suppression::ReleasedInside)
                } else {
                    Decision::Fire
                }
            }
        }
    }

    fn on_release<L>(&self, event: &Event<K>, lookup: &L)
    where
        L: NodeLookup<K> + ?Sized,
    {
        match self.decide(event, lookup) {
            Decision::Fire => {
                tracing::trace!(event_type = %event.event_type, "outside gesture");
                (self.action)(event);
            }
            Decision::Suppress(reason) => {
                tracing::trace!(event_type = %event.event_type, ?reason, "release suppressed");
            }
        }
    }
}

/// Detector for gestures outside a target node.
///
/// Listeners are registered on construction and removed by
/// [`Outside::destroy`] or on drop. [`Outside::activate`] and
/// [`Outside::deactivate`] only toggle whether releases are acted upon.
pub struct Outside<K: Clone + PartialEq + 'static> {
    bus: Rc<EventBus<K>>,
    state: Rc<State<K>>,
    subscriptions: RefCell<SmallVec<[Subscription; 3]>>,
    destroyed: Cell<bool>,
}

impl<K: Clone + PartialEq + core::fmt::Debug + 'static> core::fmt::Debug for Outside<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Outside")
            .field("target", &self.state.target)
            .field("active", &self.state.active.get())
            .field("destroyed", &self.destroyed.get())
            .field("subscriptions", &self.subscriptions.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<K: Clone + PartialEq + 'static> Outside<K> {
    /// Create a detector for `target` and register its listeners on `bus`.
    ///
    /// `action` receives the release event of every outside gesture.
    pub fn new(
        bus: &Rc<EventBus<K>>,
        target: K,
        action: impl Fn(&Event<K>) + 'static,
        options: OutsideOptions,
    ) -> Self {
        let OutsideOptions {
            active,
            except_selector,
            event_types,
            capture,
            passive,
            ignore_initial_trigger,
            press_type,
        } = options;

        let state = Rc::new(State {
            target,
            action: Box::new(action),
            except_selector,
            active: Cell::new(active),
            reference_mark: ignore_initial_trigger.then(|| bus.now()),
            press_path: RefCell::new(None),
        });

        let passive_supported = supports_passive(bus);
        let mut subscriptions = SmallVec::new();
        if let Some(press_type) = press_type {
            let state = state.clone();
            let options = AddListenerOptions {
                capture: false,
                passive: passive_supported,
            };
            subscriptions.push(bus.subscribe(press_type, &options, move |event, lookup| {
                state.record_press(event, lookup);
            }));
        }
        let release_options = AddListenerOptions {
            capture,
            passive: passive && passive_supported,
        };
        for event_type in event_types {
            let state = state.clone();
            subscriptions.push(bus.subscribe(
                event_type,
                &release_options,
                move |event, lookup| state.on_release(event, lookup),
            ));
        }
        tracing::debug!(
            listeners = subscriptions.len(),
            active,
            capture,
            "outside detector created"
        );

        Self {
            bus: bus.clone(),
            state,
            subscriptions: RefCell::new(subscriptions),
            destroyed: Cell::new(false),
        }
    }

    /// The protected node.
    pub fn target(&self) -> &K {
        &self.state.target
    }

    /// Whether releases are currently acted upon.
    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    /// Act upon subsequent releases.
    pub fn activate(&self) {
        self.state.active.set(true);
    }

    /// Ignore subsequent releases. Presses are still recorded.
    pub fn deactivate(&self) {
        self.state.active.set(false);
    }

    /// Remove every listener. Later calls do nothing.
    ///
    /// After this the action never runs again, even if the detector is
    /// activated.
    pub fn destroy(&self) {
        let subscriptions = core::mem::take(&mut *self.subscriptions.borrow_mut());
        if self.destroyed.replace(true) {
            return;
        }
        for sub in &subscriptions {
            self.bus.unsubscribe(sub.key, sub.id);
        }
        tracing::debug!(listeners = subscriptions.len(), "outside detector destroyed");
    }

    /// Whether [`Outside::destroy`] was called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Current registrations, press listener first.
    pub fn subscriptions(&self) -> SmallVec<[Subscription; 3]> {
        self.subscriptions.borrow().clone()
    }

    /// The most recently recorded press path, innermost first.
    pub fn press_path(&self) -> Option<NodePath<K>> {
        self.state.press_path.borrow().clone()
    }

    /// Evaluate a release event without running the action.
    pub fn evaluate(&self, event: &Event<K>, lookup: &dyn NodeLookup<K>) -> Decision {
        self.state.decide(event, lookup)
    }
}

impl<K: Clone + PartialEq + 'static> Drop for Outside<K> {
    fn drop(&mut self) {
        self.destroy();
    }
}
