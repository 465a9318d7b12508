// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Passive listener capability detection.
//!
//! An environment supports passive listeners when registering a listener
//! reads the `passive` option. [`probe_passive`] registers and removes a
//! no-op listener with options that record that read. [`supports_passive`]
//! runs the probe once per process and caches the answer.

use core::cell::Cell;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::bus::{EventBus, ListenerOptions};
use crate::types::EventType;

const UNKNOWN: u8 = 0;
const UNSUPPORTED: u8 = 1;
const SUPPORTED: u8 = 2;

static PASSIVE_SUPPORT: AtomicU8 = AtomicU8::new(UNKNOWN);

const PROBE_EVENT: EventType = EventType::new("passive-probe");

struct ProbeOptions {
    read: Cell<bool>,
}

impl ListenerOptions for ProbeOptions {
    fn capture(&self) -> bool {
        false
    }

    fn passive(&self) -> bool {
        self.read.set(true);
        false
    }
}

/// Probe `bus` for passive listener support without caching.
pub fn probe_passive<K>(bus: &EventBus<K>) -> bool {
    let options = ProbeOptions {
        read: Cell::new(false),
    };
    let sub = bus.subscribe(PROBE_EVENT, &options, |_, _| {});
    bus.unsubscribe(sub.key, sub.id);
    options.read.get()
}

/// Whether the environment honors passive listeners.
///
/// The first call probes `bus`; every later call returns the cached answer,
/// whichever bus it is given.
pub fn supports_passive<K>(bus: &EventBus<K>) -> bool {
    match PASSIVE_SUPPORT.load(Ordering::Relaxed) {
        SUPPORTED => true,
        UNSUPPORTED => false,
        _ => {
            let supported = probe_passive(bus);
            let value = if supported { SUPPORTED } else { UNSUPPORTED };
            // First writer wins so every caller agrees on one answer.
            match PASSIVE_SUPPORT.compare_exchange(
                UNKNOWN,
                value,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    tracing::debug!(supported, "passive listener support probed");
                    supported
                }
                Err(cached) => cached == SUPPORTED,
            }
        }
    }
}
