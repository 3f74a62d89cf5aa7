#![deny(missing_docs)]

/*! # DS2482
 *
 * A register-level emulation of the Analog Devices DS2482 I2C to
 * 1-Wire bridge family. The bridge exposes the two-wire side of the
 * chip to a host as a pair of [`write`](Ds2482::write) and
 * [`read`](Ds2482::read) byte operations and drives
 * [`onewire-bus`](onewire_bus) segments on the 1-Wire side.
 *
 * The single-channel DS2482-100 maps to [`Ds2482::new`]; the
 * eight-channel DS2482-800 maps to [`Ds2482Builder`] with `CHANNELS`
 * set to 8 and one bus wired per populated channel.
 */

pub use onewire_bus::{OneWireMaster, OneWireMessage, SharedBus};

mod commands;
mod error;
mod registers;

pub use commands::Command;
pub use error::Ds2482Error;
pub use registers::{Configuration, Register, Status};

/// An emulated DS2482 bridge with `CHANNELS` 1-Wire channels.
///
/// Hosts drive it one byte at a time: [`write`](Self::write) carries
/// command opcodes and payloads, [`read`](Self::read) returns the
/// register the read pointer addresses. The bridge is also the bus
/// master of every wired channel, so presence pulses and relayed
/// traffic arrive through its [`OneWireMaster`] implementation.
pub struct Ds2482<const CHANNELS: usize = 1> {
    pub(crate) status: Status,
    pub(crate) config: Configuration,
    pub(crate) pointer: u8,
    pub(crate) pending: Option<Command>,
    pub(crate) buffer: u8,
    pub(crate) bit_cursor: u8,
    pub(crate) triplet_armed: bool,
    pub(crate) channel: u8,
    pub(crate) channels: [Option<SharedBus>; CHANNELS],
}

/// Builder wiring bus segments to the channels of a [`Ds2482`].
pub struct Ds2482Builder<const CHANNELS: usize = 1> {
    channels: [Option<SharedBus>; CHANNELS],
}

impl<const CHANNELS: usize> Default for Ds2482Builder<CHANNELS> {
    fn default() -> Self {
        Ds2482Builder {
            channels: [const { None }; CHANNELS],
        }
    }
}

impl<const CHANNELS: usize> Ds2482Builder<CHANNELS> {
    /// Wires `bus` to channel `index`. Channels left unwired behave
    /// like idle 1-Wire lines.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below `CHANNELS`.
    pub fn with_channel(mut self, index: usize, bus: SharedBus) -> Self {
        self.channels[index] = Some(bus);
        self
    }

    /// Builds the bridge in its power-on state.
    pub fn build(self) -> Ds2482<CHANNELS> {
        let mut dev = Ds2482 {
            status: Status::new(),
            config: Configuration::new(),
            pointer: 0,
            pending: None,
            buffer: 0,
            bit_cursor: 0,
            triplet_armed: false,
            channel: 0,
            channels: self.channels,
        };
        dev.device_reset();
        dev
    }
}

impl Ds2482<1> {
    /// Creates a single-channel bridge (DS2482-100) driving `bus`.
    pub fn new(bus: SharedBus) -> Self {
        Ds2482Builder::default().with_channel(0, bus).build()
    }
}

impl<const CHANNELS: usize> Ds2482<CHANNELS> {
    /// Current contents of the status register.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Current contents of the device configuration register.
    pub fn configuration(&self) -> Configuration {
        self.config
    }

    /// Index of the currently selected channel.
    pub fn selected_channel(&self) -> u8 {
        self.channel
    }
}
