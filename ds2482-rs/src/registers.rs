use bitfield_struct::bitfield;

/// Read pointer targets inside the bridge register file.
///
/// A [Set Read Pointer](crate::Command::SetReadPointer) command positions the
/// pointer on one of these registers; every host read then returns that
/// register until the pointer moves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// Device status register.
    Status = 0xf0,
    /// Read data register, holding the last byte taken off the 1-Wire side.
    ReadData = 0xe1,
    /// Channel selection register (DS2482-800 only).
    ChannelSelect = 0xd2,
    /// Device configuration register.
    Configuration = 0xc3,
}

impl TryFrom<u8> for Register {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0xf0 => Ok(Register::Status),
            0xe1 => Ok(Register::ReadData),
            0xd2 => Ok(Register::ChannelSelect),
            0xc3 => Ok(Register::Configuration),
            _ => Err("unrecognized read pointer code"),
        }
    }
}

/// Status register of the bridge.
///
/// The read-only Status register is the general means for the DS2482
/// to report bit-type data from the 1-Wire side, 1-Wire busy status,
/// and its own reset status to the host processor
/// ([datasheet](https://www.analog.com/media/en/technical-documentation/data-sheets/ds2482-800.pdf)).
/// All 1-Wire communication commands and the Device Reset command
/// position the read pointer at the Status register for the host
/// processor to read with minimal protocol overhead.
#[bitfield(u8)]
pub struct Status {
    /// The 1WB bit reports to the host processor whether the 1-Wire
    /// line is busy. While 1WB is 1 the bridge accepts no command from
    /// the host.
    pub onewire_busy: bool,
    /// The PPD bit is set when devices on the selected channel answer
    /// a 1-Wire Reset command with a presence pulse. It returns to 0
    /// only with a Device Reset.
    pub presence_detect: bool,
    /// The SD bit reports a short circuit detected on the 1-Wire line
    /// during the presence-detect cycle.
    pub short_detect: bool,
    /// The LL bit reports the idle logic state of the active 1-Wire
    /// line without initiating any 1-Wire communication.
    pub logic_level: bool,
    /// If the RST bit is 1, the bridge has performed an internal reset
    /// cycle, either caused by a power-on reset or from executing the
    /// Device Reset command.
    pub device_reset: bool,
    /// The SBR bit reports the logic state of the active 1-Wire line
    /// sampled by a 1-Wire Single Bit command or the first bit of a
    /// 1-Wire Triplet command.
    pub single_bit_result: bool,
    /// The TSB bit reports the second bit sampled by a 1-Wire Triplet
    /// command, the complement read slot of the search algorithm. It is
    /// updated only by a Triplet command and has no function with
    /// other commands.
    pub triplet_second_bit: bool,
    /// Whenever a 1-Wire Triplet command is executed, this bit reports
    /// to the host processor the search direction that was chosen by
    /// the third bit of the triplet.
    pub branch_dir_taken: bool,
}

impl Status {
    /// Register contents right after a device reset: RST and LL set,
    /// everything else clear.
    pub const fn reset_value() -> Self {
        Self::new().with_device_reset(true).with_logic_level(true)
    }
}

/// Device configuration register of the bridge.
///
/// The lower nibble selects 1-Wire features (APU, SPU, 1WS in any
/// combination). Hosts write the register through the Write
/// Configuration command with the upper nibble carrying the one's
/// complement of the lower one; the bridge stores the byte exactly as
/// written, so a readback returns what the host sent. After a device
/// reset the register reads f0h.
#[bitfield(u8)]
pub struct Configuration {
    /// The APU bit controls whether an active pullup (low impedance
    /// transistor) or a passive pullup resistor is used to drive the
    /// 1-Wire line from low to high. Enabling active pullup is
    /// generally recommended for best 1-Wire bus performance.
    pub active_pullup: bool,
    reserved: bool,
    /// The SPU bit activates the strong pullup function prior to a
    /// 1-Wire Write Byte or 1-Wire Single Bit command. Strong pullup
    /// is commonly used with parasitically powered temperature sensors
    /// during a conversion.
    pub strong_pullup: bool,
    /// The 1WS bit selects overdrive speed for all 1-Wire
    /// communication generated by the bridge. All 1-Wire slave devices
    /// support standard speed (1WS = 0).
    pub onewire_speed: bool,
    /// Upper nibble as last written. Hosts transmit the one's
    /// complement of the feature nibble here.
    #[bits(4)]
    pub complement: u8,
}

const fn cfg_to_u8(cfg: u8) -> u8 {
    (cfg & 0x0f) | ((!cfg & 0x0f) << 4)
}

impl Configuration {
    /// Register contents right after a device reset: all features off,
    /// complement nibble all ones.
    pub const fn reset_value() -> Self {
        Self::from_bits(0xf0)
    }

    /// Encodes the feature nibble the way the Write Configuration
    /// command expects it on the wire, with the one's complement in
    /// the upper nibble.
    pub const fn encoded(self) -> u8 {
        cfg_to_u8(self.into_bits())
    }
}

// Codes reported by the channel selection register, one per channel.
// Reading the register back after a selection returns the code of the
// channel now active, which is how hosts confirm the switch.
pub(crate) const CHANNEL_ACK: [u8; 8] = [0xb8, 0xb1, 0xaa, 0xa3, 0x9c, 0x95, 0x8e, 0x87];
