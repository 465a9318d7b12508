// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A dropdown menu that closes on outside gestures.
//!
//! This example shows:
//! - opening a menu from a toggle button without the opening click closing it,
//! - a drag that starts inside the menu and ends outside keeping it open,
//! - the toggle excluded through an exception selector.
//!
//! Every decision is logged at trace level.
//!
//! Run:
//! - `cargo run -p understory_outside_demos --example dropdown_menu`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::Point;
use tracing_subscriber::filter::LevelFilter;
use understory_outside::bus::EventBus;
use understory_outside::dom::{Document, NodeId};
use understory_outside::types::EventType;
use understory_outside::{Outside, OutsideOptions};

const TOGGLE_AT: Point = Point::new(10.0, 10.0);
const ITEM_AT: Point = Point::new(20.0, 48.0);
const PAGE_AT: Point = Point::new(300.0, 200.0);

struct Menu {
    open: Rc<Cell<bool>>,
    detector: RefCell<Option<Outside<NodeId>>>,
}

impl Menu {
    fn open(&self, bus: &Rc<EventBus<NodeId>>, list: NodeId) {
        self.open.set(true);
        let open = self.open.clone();
        let options = OutsideOptions::new()
            .with_except_selector("#toggle")
            .expect("static selector")
            .with_ignore_initial_trigger(true);
        let detector = Outside::new(
            bus,
            list,
            move |event| {
                println!(
                    "  outside {} on {:?} at {:?}: closing",
                    event.event_type, event.target, event.position
                );
                open.set(false);
            },
            options,
        );
        // Dropping the previous detector unregisters it.
        *self.detector.borrow_mut() = Some(detector);
    }
}

/// Press on `press` at `from`, release on `release` at `to`.
fn gesture(
    bus: &EventBus<NodeId>,
    doc: &Document,
    (press, from): (NodeId, Point),
    (release, to): (NodeId, Point),
) {
    bus.advance(16);
    let down = bus.event(EventType::POINTER_DOWN, Some(press)).with_position(from);
    bus.dispatch(&down, doc);
    bus.advance(16);
    let up = bus.event(EventType::POINTER_UP, Some(release)).with_position(to);
    bus.dispatch(&up, doc);
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .without_time()
        .compact()
        .init();

    let mut doc = Document::new();
    let toggle = doc.create_element("button");
    doc.set_id(toggle, "toggle");
    let list = doc.create_element("ul");
    doc.add_class(list, "menu");
    let item = doc.create_element("li");
    let page = doc.create_element("main");
    doc.append_child(doc.root(), toggle);
    doc.append_child(doc.root(), list);
    doc.append_child(list, item);
    doc.append_child(doc.root(), page);

    let bus: Rc<EventBus<NodeId>> = Rc::new(EventBus::new());
    let menu = Menu {
        open: Rc::new(Cell::new(false)),
        detector: RefCell::new(None),
    };

    println!("press the toggle and open the menu while the release is in flight");
    bus.advance(16);
    let down = bus.event(EventType::POINTER_DOWN, Some(toggle));
    bus.dispatch(&down.with_position(TOGGLE_AT), &doc);
    menu.open(&bus, list);
    let up = bus.event(EventType::POINTER_UP, Some(toggle));
    bus.dispatch(&up.with_position(TOGGLE_AT), &doc);
    println!("  open: {}", menu.open.get());

    println!("drag from a menu item onto the page");
    gesture(&bus, &doc, (item, ITEM_AT), (page, PAGE_AT));
    println!("  open: {}", menu.open.get());

    println!("click the toggle again");
    gesture(&bus, &doc, (toggle, TOGGLE_AT), (toggle, TOGGLE_AT));
    println!("  open: {}", menu.open.get());

    println!("click the page");
    gesture(&bus, &doc, (page, PAGE_AT), (page, PAGE_AT));
    println!("  open: {}", menu.open.get());

    if let Some(detector) = menu.detector.borrow_mut().take() {
        detector.destroy();
    }
    println!("listeners left: {}", bus.listener_count());
}
