use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;
use ds18b20::Ds18b20;
use ds2482::{Command, Configuration, Ds2482, Ds2482Builder, Register, Status};
use onewire_bus::{ONEWIRE_SEARCH_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireBus, OneWireCrc};

/// Runs a host session against an emulated DS2482-800 bridge with a
/// DS18B20 temperature sensor wired to channel 0
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Sensor ROM identifier as 16 hex characters
    #[arg(short, long, default_value = "280102030405069e")]
    serial: String,
    /// Sensor temperature in hundredths of a degree Celsius
    #[arg(short, long, default_value_t = 2500, allow_hyphen_values = true)]
    temperature: i16,
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Build the fabric: one bus segment with a sensor, wired to
    // channel 0 of an eight-channel bridge
    let sensor = Ds18b20::from_serial_str(&args.serial)
        .expect("Invalid sensor serial")
        .with_temperature(args.temperature);
    let bus = Rc::new(RefCell::new(OneWireBus::new()));
    bus.borrow_mut().attach(Rc::new(RefCell::new(sensor)));
    let mut bridge = Ds2482Builder::<8>::default().with_channel(0, bus).build();

    // Reset the bridge and show the power-on status
    bridge
        .write(Command::DeviceReset as u8)
        .expect("Failed to reset the bridge");
    log::info!("Status after device reset: {:#04x}", bridge.read());

    // Enable active pullup and read the configuration back
    bridge
        .write(Command::WriteConfiguration as u8)
        .expect("Failed to issue configuration write");
    bridge
        .write(Configuration::new().with_active_pullup(true).encoded())
        .expect("Failed to write configuration");
    log::info!("Configuration readback: {:#04x}", bridge.read());

    // Select channel 0 and confirm the switch
    bridge
        .write(Command::ChannelSelect as u8)
        .expect("Failed to issue channel select");
    bridge.write(0x00).expect("Failed to select channel 0");
    log::info!("Channel select acknowledged: {:#04x}", bridge.read());

    // Generate a reset/presence-detect cycle
    bridge
        .write(Command::OneWireReset as u8)
        .expect("Failed to reset the 1-Wire line");
    let status = Status::from_bits(bridge.read());
    if !status.presence_detect() {
        log::warn!("No presence pulse on channel 0");
        return;
    }
    log::info!("Presence pulse detected");

    // Recover the ROM identifier bit by bit with triplet commands
    let rom = search_rom(&mut bridge);
    let serial = rom.to_le_bytes();
    log::info!("ROM: {rom:016x}");
    if !OneWireCrc::validate(&serial) {
        log::warn!("ROM checksum mismatch");
    }
    if serial[0] == Ds18b20::family() {
        log::info!("Family code {:#04x} is a DS18B20", serial[0]);
    }

    // Trigger a conversion, then read the scratchpad back
    one_wire_reset(&mut bridge);
    write_bus_byte(&mut bridge, ONEWIRE_SKIP_ROM_CMD);
    write_bus_byte(&mut bridge, DS18B20_START_CONV);
    one_wire_reset(&mut bridge);
    write_bus_byte(&mut bridge, ONEWIRE_SKIP_ROM_CMD);
    write_bus_byte(&mut bridge, DS18B20_READ_SCRATCH);
    let mut scratchpad = [0u8; 9];
    for byte in scratchpad.iter_mut() {
        *byte = read_bus_byte(&mut bridge);
    }
    log::debug!("Scratchpad: {scratchpad:02x?}");
    if !OneWireCrc::validate(&scratchpad) {
        log::warn!("Scratchpad checksum mismatch");
    }
    let temperature = ds18b20::Temperature::from_le_bytes([scratchpad[0], scratchpad[1]]);
    log::info!("Temperature: {temperature} C");

    // Query the power supply mode
    one_wire_reset(&mut bridge);
    write_bus_byte(&mut bridge, ONEWIRE_SKIP_ROM_CMD);
    write_bus_byte(&mut bridge, DS18B20_READ_POWERMODE);
    let powered = read_bus_byte(&mut bridge);
    log::info!(
        "Power supply: {}",
        if powered == 0xff { "external" } else { "parasitic" }
    );
}

fn one_wire_reset<const CHANNELS: usize>(bridge: &mut Ds2482<CHANNELS>) {
    bridge
        .write(Command::OneWireReset as u8)
        .expect("Failed to reset the 1-Wire line");
}

fn write_bus_byte<const CHANNELS: usize>(bridge: &mut Ds2482<CHANNELS>, byte: u8) {
    bridge
        .write(Command::OneWireWriteByte as u8)
        .expect("Failed to issue byte write");
    bridge.write(byte).expect("Failed to write byte");
}

fn read_bus_byte<const CHANNELS: usize>(bridge: &mut Ds2482<CHANNELS>) -> u8 {
    bridge
        .write(Command::OneWireReadByte as u8)
        .expect("Failed to read byte off the bus");
    bridge
        .write(Command::SetReadPointer as u8)
        .expect("Failed to issue read pointer move");
    bridge
        .write(Register::ReadData as u8)
        .expect("Failed to move the read pointer");
    bridge.read()
}

/// Walks the 64 ROM bits with triplet commands, taking the device bit
/// at every step. With a single device on the line this recovers its
/// full identifier.
fn search_rom<const CHANNELS: usize>(bridge: &mut Ds2482<CHANNELS>) -> u64 {
    write_bus_byte(bridge, ONEWIRE_SEARCH_CMD);
    let mut rom = 0u64;
    for bit in 0..64 {
        bridge
            .write(Command::OneWireTriplet as u8)
            .expect("Failed to issue triplet");
        bridge.write(0x00).expect("Failed to write triplet direction");
        let status = Status::from_bits(bridge.read());
        if status.branch_dir_taken() {
            rom |= 1 << bit;
        }
    }
    rom
}

// DS18B20 function commands issued over the bus
const DS18B20_START_CONV: u8 = 0x44;
const DS18B20_READ_SCRATCH: u8 = 0xbe;
const DS18B20_READ_POWERMODE: u8 = 0xb4;
