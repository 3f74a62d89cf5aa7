use onewire_bus::{OneWireMaster, OneWireMessage, SharedBus};

use crate::Ds2482;
use crate::error::Ds2482Error;
use crate::registers::{CHANNEL_ACK, Configuration, Register, Status};

/// Command opcodes of the host-facing register protocol.
///
/// A command byte either completes immediately or leaves the bridge
/// waiting for one payload byte, as documented per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Performs one ROM-search step: the payload is broadcast, and the
    /// next status read extracts the device bit for this step.
    OneWireTriplet = 0x78,
    /// Generates a single 1-Wire time slot carrying the payload bit.
    OneWireSingleBit = 0x87,
    /// Reads one byte off the selected channel into the read data
    /// register. Takes no payload.
    OneWireReadByte = 0x96,
    /// Broadcasts the payload byte on the selected channel.
    OneWireWriteByte = 0xa5,
    /// Generates a reset/presence-detect cycle on the selected
    /// channel. Takes no payload.
    OneWireReset = 0xb4,
    /// Switches the active channel to the one named by the payload
    /// (DS2482-800 only).
    ChannelSelect = 0xc3,
    /// Replaces the device configuration register with the payload.
    WriteConfiguration = 0xd2,
    /// Positions the read pointer on the register named by the payload.
    SetReadPointer = 0xe1,
    /// Performs a global reset of the device state machine logic.
    /// Takes no payload.
    DeviceReset = 0xf0,
}

impl TryFrom<u8> for Command {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x78 => Ok(Command::OneWireTriplet),
            0x87 => Ok(Command::OneWireSingleBit),
            0x96 => Ok(Command::OneWireReadByte),
            0xa5 => Ok(Command::OneWireWriteByte),
            0xb4 => Ok(Command::OneWireReset),
            0xc3 => Ok(Command::ChannelSelect),
            0xd2 => Ok(Command::WriteConfiguration),
            0xe1 => Ok(Command::SetReadPointer),
            0xf0 => Ok(Command::DeviceReset),
            _ => Err("unrecognized command opcode"),
        }
    }
}

impl<const CHANNELS: usize> Ds2482<CHANNELS> {
    /// Handles one byte written by the host.
    ///
    /// The first write of an exchange carries a command opcode.
    /// Commands with a payload leave the bridge expecting it in the
    /// next write; the command completes when the payload arrives.
    pub fn write(&mut self, data: u8) -> Result<(), Ds2482Error> {
        if self.status.onewire_busy() {
            // a busy line rejects the write and forgets any armed command
            self.pending = None;
            return Err(Ds2482Error::Busy);
        }
        match self.pending.take() {
            None => self.start_command(data),
            Some(command) => self.finish_command(command, data),
        }
    }

    /// Handles one host read, returning the contents of the register
    /// the read pointer addresses.
    pub fn read(&mut self) -> u8 {
        match Register::try_from(self.pointer) {
            Ok(Register::Status) => self.read_status(),
            Ok(Register::ReadData) => self.buffer,
            Ok(Register::Configuration) => self.config.into_bits(),
            Ok(Register::ChannelSelect) => self.channel_ack(),
            Err(_) => {
                log::warn!("read pointer {:#04x} addresses no register", self.pointer);
                0
            }
        }
    }

    fn start_command(&mut self, opcode: u8) -> Result<(), Ds2482Error> {
        match Command::try_from(opcode) {
            Ok(Command::DeviceReset) => {
                self.device_reset();
                Ok(())
            }
            Ok(Command::OneWireReset) => {
                self.one_wire_reset();
                Ok(())
            }
            Ok(Command::OneWireReadByte) => {
                self.buffer = self.bus_read_byte();
                Ok(())
            }
            Ok(Command::ChannelSelect) if CHANNELS <= 1 => Err(Ds2482Error::NotSupported),
            Ok(command) => {
                self.pending = Some(command);
                Ok(())
            }
            Err(_) => {
                log::warn!("unrecognized command {opcode:#04x}");
                Ok(())
            }
        }
    }

    fn finish_command(&mut self, command: Command, payload: u8) -> Result<(), Ds2482Error> {
        match command {
            Command::SetReadPointer => {
                self.pointer = payload;
            }
            Command::WriteConfiguration => {
                // stored exactly as written, complement nibble included
                self.config = Configuration::from_bits(payload);
                self.pointer = Register::Configuration as u8;
            }
            Command::OneWireSingleBit | Command::OneWireWriteByte => {
                self.bus_broadcast(OneWireMessage::Data(payload));
                self.pointer = Register::Status as u8;
            }
            Command::OneWireTriplet => {
                self.bus_broadcast(OneWireMessage::Data(payload));
                self.pointer = Register::Status as u8;
                self.triplet_armed = true;
            }
            Command::ChannelSelect => {
                let index = payload & 0x0f;
                if (index as usize) >= CHANNELS {
                    return Err(Ds2482Error::InvalidChannel(payload));
                }
                self.channel = index;
                self.pointer = Register::ChannelSelect as u8;
            }
            // reset, 1-Wire reset and read byte complete inside
            // start_command and are never left pending
            Command::DeviceReset | Command::OneWireReset | Command::OneWireReadByte => {
                log::warn!("{command:?} takes no payload");
            }
        }
        Ok(())
    }

    pub(crate) fn device_reset(&mut self) {
        self.status = Status::reset_value();
        self.config = Configuration::reset_value();
        self.pointer = Register::Status as u8;
        self.channel = 0;
    }

    fn one_wire_reset(&mut self) {
        if self.bus_broadcast(OneWireMessage::Reset) {
            // the presence pulse comes back through our bus-master role
            OneWireMaster::send(self, OneWireMessage::Reset);
        }
        self.pointer = Register::Status as u8;
    }

    fn read_status(&mut self) -> u8 {
        if self.triplet_armed {
            self.triplet_armed = false;
            if self.bit_cursor == 0 {
                self.buffer = self.bus_read_byte();
            }
            let bit = self.buffer & (1 << self.bit_cursor) != 0;
            self.bit_cursor = (self.bit_cursor + 1) % 8;
            // the device bit surfaces as the taken direction, its
            // complement as the second read slot
            self.status.set_triplet_second_bit(!bit);
            self.status.set_branch_dir_taken(bit);
        }
        self.status.into_bits()
    }

    fn channel_ack(&self) -> u8 {
        match CHANNEL_ACK.get(self.channel as usize) {
            Some(&code) => code,
            None => {
                log::warn!("channel {} has no acknowledgement code", self.channel);
                0
            }
        }
    }

    fn channel_bus(&self) -> Option<SharedBus> {
        self.channels.get(self.channel as usize)?.clone()
    }

    fn bus_broadcast(&mut self, message: OneWireMessage) -> bool {
        let Some(bus) = self.channel_bus() else {
            log::warn!("channel {} has no bus wired", self.channel);
            return false;
        };
        let mut bus = bus.borrow_mut();
        match message {
            OneWireMessage::Reset => bus.broadcast_reset(),
            OneWireMessage::Data(byte) => bus.broadcast_byte(byte),
        }
    }

    fn bus_read_byte(&mut self) -> u8 {
        let Some(bus) = self.channel_bus() else {
            log::warn!("channel {} has no bus wired", self.channel);
            return 0;
        };
        bus.borrow_mut().read_byte()
    }
}

impl<const CHANNELS: usize> OneWireMaster for Ds2482<CHANNELS> {
    fn send(&mut self, message: OneWireMessage) -> bool {
        match message {
            OneWireMessage::Reset => {
                self.status.set_presence_detect(true);
                true
            }
            OneWireMessage::Data(byte) => self.bus_broadcast(OneWireMessage::Data(byte)),
        }
    }
}
