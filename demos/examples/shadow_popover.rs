// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A popover rendered inside a shadow tree.
//!
//! This example shows:
//! - content in a shadow tree counting as inside its host,
//! - the same detector on a tree that cannot report composed paths, where
//!   the containment fallback decides. It only follows parent links, so a
//!   release inside the shadow tree cannot be placed and is ignored, like a
//!   release on a detached node.
//!
//! Run:
//! - `cargo run -p understory_outside_demos --example shadow_popover`

use std::cell::Cell;
use std::rc::Rc;

use tracing_subscriber::filter::LevelFilter;
use understory_outside::bus::EventBus;
use understory_outside::dom::{Document, NodeId};
use understory_outside::types::EventType;
use understory_outside::{Outside, OutsideOptions};

fn gesture(bus: &EventBus<NodeId>, doc: &Document, node: NodeId) {
    bus.advance(16);
    bus.dispatch(&bus.event(EventType::POINTER_DOWN, Some(node)), doc);
    bus.advance(16);
    bus.dispatch(&bus.event(EventType::POINTER_UP, Some(node)), doc);
}

fn run(doc: &mut Document, label: &str) {
    let host = doc.create_element("x-popover");
    let page = doc.create_element("main");
    doc.append_child(doc.root(), host);
    doc.append_child(doc.root(), page);
    let shadow = doc.attach_shadow(host).expect("fresh element");
    let button = doc.create_element("button");
    doc.append_child(shadow, button);
    let stray = doc.create_element("div");

    let bus: Rc<EventBus<NodeId>> = Rc::new(EventBus::new());
    let closes = Rc::new(Cell::new(0));
    let c = closes.clone();
    let _popover = Outside::new(&bus, host, move |_| c.set(c.get() + 1), OutsideOptions::new());

    println!("{label}");
    gesture(&bus, doc, button);
    println!("  button inside the shadow tree -> closes: {}", closes.get());
    gesture(&bus, doc, page);
    println!("  page -> closes: {}", closes.get());
    gesture(&bus, doc, stray);
    println!("  detached node -> closes: {}", closes.get());
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .without_time()
        .compact()
        .init();

    run(&mut Document::new(), "with composed paths");
    run(
        &mut Document::new().with_composed_path_support(false),
        "without composed paths",
    );
}
