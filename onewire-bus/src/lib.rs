#![deny(missing_docs)]
//! # onewire-bus
//! A byte-level emulation of the 1-Wire bus fabric.
//!
//! This crate models the shared medium that 1-Wire devices hang off of, at the
//! granularity of whole bytes rather than electrical time slots. A
//! [`OneWireBus`] routes the two kinds of [`OneWireMessage`] (reset pulses
//! and data bytes) from a bus master down to every attached
//! [`OneWireClient`], and arbitrates device-to-master reads by handing the
//! bus to the first attached client that has data queued.
//!
//! Device models (bridges, sensors) live in their own crates and plug in
//! through the [`OneWireClient`] and [`OneWireMaster`] traits. The
//! [`OneWireCrc`] type implements the Dallas/Maxim CRC-8 that protects ROM
//! serials and scratchpad transfers.

mod bus;
mod traits;
mod utils;
pub use bus::{OneWireBus, SharedBus, SharedClient};
pub use traits::{OneWireClient, OneWireMaster, OneWireMessage};
pub use utils::OneWireCrc;

/// Command to read the ROM serial of the only device on a single-drop bus
pub const ONEWIRE_READ_ROM_CMD: u8 = 0x33;

/// Command to match a specific ROM address in 1-Wire communication (non-overdrive mode)
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM address in 1-Wire communication (non-overdrive mode)
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;

/// Command to search for devices on the 1-Wire bus
pub const ONEWIRE_SEARCH_CMD: u8 = 0xf0;

/// Command to search for devices in alarm state on the 1-Wire bus
pub const ONEWIRE_CONDITIONAL_SEARCH_CMD: u8 = 0xec;
