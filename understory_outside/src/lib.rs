// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_outside --heading-base-level=0

//! Understory Outside: detect interactions that happen outside a UI element.
//!
//! ## Overview
//!
//! Dropdowns, popovers, and modal dialogs close when the user interacts
//! somewhere else. Doing that correctly takes more than checking where a
//! click landed: a drag that starts inside a menu and ends outside must not
//! close it, content rendered in a shadow tree must count as inside its host,
//! and the click that opened a component must not immediately close it.
//!
//! [`Outside`](crate::outside::Outside) correlates the press and release of
//! each gesture and calls an action only when both happen outside the target.
//!
//! ## Pieces
//!
//! - [`EventBus`](crate::bus::EventBus): the shared listener registry events are dispatched through.
//! - [`NodeLookup`](crate::lookup::NodeLookup): read-only access to the host tree: parents, shadow hosts, attributes.
//! - [`Document`](crate::dom::Document): a small arena tree implementing `NodeLookup`, for tests and headless hosts.
//! - [`Selector`](crate::selector::Selector): the exception selector language (`tag`, `#id`, `.class`, `[attr=value]`, descendant and child combinators).
//! - [`composed_path`](crate::path::composed_path): the nodes an event passed through, across shadow boundaries.
//! - [`supports_passive`](crate::passive::supports_passive): cached capability probe for passive listeners.
//!
//! ## Workflow
//!
//! 1) Build or adapt a tree that implements [`NodeLookup`](crate::lookup::NodeLookup).
//! 2) Create one [`EventBus`](crate::bus::EventBus) per event source and share it behind an `Rc`.
//! 3) Create a detector per component with [`OutsideOptions`](crate::outside::OutsideOptions).
//! 4) Feed press and release events to [`EventBus::dispatch`](crate::bus::EventBus::dispatch).
//! 5) Destroy the detector, or drop it, when the component goes away.
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
//! let menu = doc.create_element("ul");
//! let toggle = doc.create_element("button");
//! doc.set_id(toggle, "toggle");
//! doc.append_child(doc.root(), menu);
//! doc.append_child(doc.root(), toggle);
//!
//! let bus = Rc::new(EventBus::new());
//! let open = Rc::new(Cell::new(true));
//! let o = open.clone();
//! let options = OutsideOptions::new().with_except_selector("#toggle").unwrap();
//! let _detector = Outside::new(&bus, menu, move |_| o.set(false), options);
//!
//! // The toggle manages the menu itself.
//! bus.dispatch(&bus.event(EventType::POINTER_DOWN, Some(toggle)), &doc);
//! bus.dispatch(&bus.event(EventType::POINTER_UP, Some(toggle)), &doc);
//! assert!(open.get());
//!
//! bus.dispatch(&bus.event(EventType::POINTER_DOWN, Some(doc.root())), &doc);
//! bus.dispatch(&bus.event(EventType::POINTER_UP, Some(doc.root())), &doc);
//! assert!(!open.get());
//! ```
//!
//! ## Threading
//!
//! Everything here is single-threaded: detectors share state through `Rc`
//! and `Cell`. Only the passive capability answer is process-wide.
//!
//! ## Logging
//!
//! Registration and removal are logged at `debug`, and every release
//! decision at `trace`, through `tracing`. Install a subscriber to see them.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod bus;
pub mod dom;
pub mod lookup;
pub mod matcher;
pub mod outside;
pub mod passive;
pub mod path;
pub mod selector;
pub mod types;

#[cfg(test)]
mod testing;

pub use outside::{Decision, Outside, OutsideOptions, Suppression};
