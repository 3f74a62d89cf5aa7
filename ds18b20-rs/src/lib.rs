//! Emulated DS18B20 digital thermometer, attached to a 1-Wire bus as a client.

use fixed::types::I12F4;
use onewire_bus::{
    ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_ROM_CMD,
    ONEWIRE_SEARCH_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireClient, OneWireCrc, OneWireMessage,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Ds18b20Error {
    #[error("serial must be 16 hex characters, got {0}")]
    SerialLength(usize),
    #[error("serial contains a non-hex character")]
    SerialDigit,
}

/// One emulated sensor: an 8-byte ROM serial, a 9-byte scratchpad, and the
/// temperature it will report, in hundredths of a degree Celsius.
///
/// The sensor answers reset pulses with a presence acknowledgement and
/// interprets data bytes as ROM/function commands. Response bytes are queued
/// until the bus collects them.
#[derive(Debug)]
pub struct Ds18b20 {
    serial: [u8; 8],
    scratchpad: [u8; 9],
    pending_read: Option<ReadCursor>,
    temperature: i16,
}

#[derive(Debug, Clone, Copy)]
struct ReadCursor {
    source: ReadSource,
    pos: u8,
    len: u8,
}

#[derive(Debug, Clone, Copy)]
enum ReadSource {
    Rom,
    Scratchpad,
}

impl Ds18b20 {
    /// ROM family code of the DS18B20.
    #[inline]
    pub const fn family() -> u8 {
        0x28
    }

    pub fn new(serial: [u8; 8]) -> Self {
        Self {
            serial,
            scratchpad: [0; 9],
            pending_read: None,
            temperature: 0,
        }
    }

    /// Builds a sensor from a 16-hex-character serial string.
    pub fn from_serial_str(serial: &str) -> Result<Self, Ds18b20Error> {
        Ok(Self::new(parse_serial(serial)?))
    }

    pub fn with_temperature(mut self, centidegrees: i16) -> Self {
        self.temperature = centidegrees;
        self
    }

    pub fn set_temperature(&mut self, centidegrees: i16) {
        self.temperature = centidegrees;
    }

    pub fn temperature(&self) -> i16 {
        self.temperature
    }

    /// Replaces the serial; the stored one is untouched on a parse error.
    pub fn set_serial_str(&mut self, serial: &str) -> Result<(), Ds18b20Error> {
        self.serial = parse_serial(serial)?;
        Ok(())
    }

    pub fn serial(&self) -> [u8; 8] {
        self.serial
    }

    pub fn serial_str(&self) -> String {
        self.serial.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// The serial as the 64-bit ROM value a search reports (little endian).
    pub fn rom(&self) -> u64 {
        u64::from_le_bytes(self.serial)
    }

    pub fn scratchpad(&self) -> &[u8; 9] {
        &self.scratchpad
    }

    fn handle_command(&mut self, command: u8) {
        match command {
            // bit-level payloads of the single-bit and triplet primitives
            // arrive as bare bytes
            0x00 => {}
            ONEWIRE_SEARCH_CMD => self.queue_read(ReadSource::Rom, 8),
            ONEWIRE_SKIP_ROM_CMD => {}
            DS18B20_START_CONV => self.convert_temperature(),
            DS18B20_READ_SCRATCH => self.queue_read(ReadSource::Scratchpad, 9),
            DS18B20_READ_POWERMODE => {
                // always externally powered
                self.scratchpad[0] = 0xff;
                self.queue_read(ReadSource::Scratchpad, 1);
            }
            ONEWIRE_READ_ROM_CMD
            | ONEWIRE_MATCH_ROM_CMD
            | ONEWIRE_CONDITIONAL_SEARCH_CMD
            | DS18B20_WRITE_SCRATCH
            | DS18B20_COPY_SCRATCH
            | DS18B20_RECALL_EEPROM => {
                log::debug!("command {command:#04x} not modeled");
            }
            _ => log::warn!("unhandled command {command:#04x}"),
        }
    }

    fn convert_temperature(&mut self) {
        // whole degrees only, scaled into the I12F4 register layout
        let raw = Temperature::from_num(self.temperature / 100);
        self.scratchpad[..2].copy_from_slice(&raw.to_le_bytes());
        self.scratchpad[8] = OneWireCrc::checksum(&self.scratchpad[..8]);
    }

    fn queue_read(&mut self, source: ReadSource, len: u8) {
        self.pending_read = Some(ReadCursor {
            source,
            pos: 0,
            len,
        });
    }
}

impl OneWireClient for Ds18b20 {
    fn send(&mut self, message: OneWireMessage) -> bool {
        match message {
            // presence pulse
            OneWireMessage::Reset => true,
            OneWireMessage::Data(command) => {
                self.handle_command(command);
                false
            }
        }
    }

    fn recv(&mut self) -> u8 {
        let Some(cursor) = self.pending_read.as_mut() else {
            log::warn!("bus read with nothing queued");
            return 0;
        };
        let byte = match cursor.source {
            ReadSource::Rom => self.serial[cursor.pos as usize],
            ReadSource::Scratchpad => self.scratchpad[cursor.pos as usize],
        };
        cursor.pos += 1;
        if cursor.pos >= cursor.len {
            self.pending_read = None;
        }
        byte
    }

    fn has_data(&self) -> bool {
        self.pending_read.is_some()
    }
}

fn parse_serial(serial: &str) -> Result<[u8; 8], Ds18b20Error> {
    if serial.len() != 16 {
        return Err(Ds18b20Error::SerialLength(serial.len()));
    }
    if !serial.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Ds18b20Error::SerialDigit);
    }
    let mut bytes = [0; 8];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&serial[2 * i..2 * i + 2], 16)
            .map_err(|_| Ds18b20Error::SerialDigit)?;
    }
    Ok(bytes)
}

const DS18B20_START_CONV: u8 = 0x44;
const DS18B20_WRITE_SCRATCH: u8 = 0x4e;
const DS18B20_READ_SCRATCH: u8 = 0xbe;
const DS18B20_COPY_SCRATCH: u8 = 0x48;
const DS18B20_READ_POWERMODE: u8 = 0xb4;
const DS18B20_RECALL_EEPROM: u8 = 0xb8;

pub type Temperature = I12F4;
