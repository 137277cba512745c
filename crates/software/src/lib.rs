//! This crate contains architecture-agnostic logic for the MIDI Hub, a standalone controller which aggregates several
//! USB MIDI class devices and forwards traffic between them according to user-defined routes, no host computer required.
//!
//! Routes are created and deleted through a small menu system driven by a rotary encoder or a serial console. Everything
//! the menu system needs (the persistent [`route_table::RouteTable`], the page state machine in [`navigation`], the
//! notification queue in [`timed_queue`], and the screensaver logic in [`sleep`]) lives here so it can be tested on the
//! host; the board-specific glue lives in the firmware crate.

#![deny(missing_docs)]
#![no_std]

// must come first so the logging macros are visible to every other module
mod fmt;

pub mod configuration;

/// Identities of attached MIDI devices and the directory that tracks them.
pub mod device;

/// Hub-level orchestration of routes, pages, and power states.
pub mod hub;

pub mod input;
pub mod navigation;
pub mod render;
pub mod route_table;
pub mod sleep;

/// Byte-addressed persistent storage.
pub mod storage;

pub mod text;
pub mod timed_queue;
