/// Running Dallas/Maxim CRC-8 over a byte stream.
///
/// Feedback polynomial x^8 + x^5 + x^4 + 1, bit-reversed (mask `0x8c`),
/// initial value 0. This is the checksum that terminates 1-Wire ROM serials
/// and DS18B20-family scratchpads: running it over a payload *and* its
/// trailing checksum byte leaves 0 when the sequence is intact.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OneWireCrc(u8);

impl OneWireCrc {
    /// Starts a fresh computation.
    pub const fn new() -> Self {
        Self(0)
    }

    /// The CRC of everything folded in so far.
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Folds one byte into the running CRC.
    pub fn update(&mut self, byte: u8) {
        let mut crc = self.0 ^ byte;
        for _ in 0..u8::BITS {
            let feedback = crc & 0x1 != 0;
            crc >>= 1;
            if feedback {
                crc ^= 0x8c;
            }
        }
        self.0 = crc;
    }

    /// One-shot CRC of a byte slice.
    pub fn checksum(bytes: &[u8]) -> u8 {
        let mut crc = Self::new();
        for &byte in bytes {
            crc.update(byte);
        }
        crc.value()
    }

    /// Validates a sequence whose final byte is the CRC of the bytes before
    /// it, such as an 8-byte ROM serial or a 9-byte scratchpad dump.
    pub fn validate(sequence: &[u8]) -> bool {
        Self::checksum(sequence) == 0
    }
}
