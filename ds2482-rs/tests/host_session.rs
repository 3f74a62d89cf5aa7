//! Drives the bridge the way a host driver would, with an emulated
//! DS18B20 answering on the 1-Wire side.

use std::cell::RefCell;
use std::rc::Rc;

use ds18b20::Ds18b20;
use ds2482::{Command, Ds2482, Ds2482Builder, Register, Status};
use onewire_bus::{ONEWIRE_SEARCH_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireBus, OneWireCrc};

// DS18B20 function commands as a host driver issues them.
const START_CONVERSION: u8 = 0x44;
const READ_SCRATCHPAD: u8 = 0xbe;
const READ_POWER_SUPPLY: u8 = 0xb4;

fn sensor_serial() -> [u8; 8] {
    let mut serial = [0x28, 0x9a, 0x01, 0x44, 0x77, 0x02, 0x10, 0x00];
    serial[7] = OneWireCrc::checksum(&serial[..7]);
    serial
}

fn rig(temperature: i16) -> Ds2482<1> {
    let bus = Rc::new(RefCell::new(OneWireBus::new()));
    let sensor = Rc::new(RefCell::new(
        Ds18b20::new(sensor_serial()).with_temperature(temperature),
    ));
    bus.borrow_mut().attach(sensor);
    Ds2482::new(bus)
}

fn read_register<const CHANNELS: usize>(
    bridge: &mut Ds2482<CHANNELS>,
    register: Register,
) -> u8 {
    bridge.write(Command::SetReadPointer as u8).unwrap();
    bridge.write(register as u8).unwrap();
    bridge.read()
}

/// One 1-Wire byte read through the read data register.
fn read_bus_byte<const CHANNELS: usize>(bridge: &mut Ds2482<CHANNELS>) -> u8 {
    bridge.write(Command::OneWireReadByte as u8).unwrap();
    read_register(bridge, Register::ReadData)
}

fn write_bus_byte<const CHANNELS: usize>(bridge: &mut Ds2482<CHANNELS>, byte: u8) {
    bridge.write(Command::OneWireWriteByte as u8).unwrap();
    bridge.write(byte).unwrap();
}

/// Recovers a ROM identifier bit by bit with triplet commands, the way
/// the standard search algorithm does on a single-device bus.
fn search_rom<const CHANNELS: usize>(bridge: &mut Ds2482<CHANNELS>) -> u64 {
    bridge.write(Command::OneWireReset as u8).unwrap();
    write_bus_byte(bridge, ONEWIRE_SEARCH_CMD);
    let mut rom = 0u64;
    for bit in 0..64 {
        bridge.write(Command::OneWireTriplet as u8).unwrap();
        bridge.write(0x00).unwrap();
        let status = Status::from_bits(bridge.read());
        if status.branch_dir_taken() {
            rom |= 1 << bit;
        }
    }
    rom
}

#[test]
fn reset_reports_presence() {
    let mut bridge = rig(2500);
    bridge.write(Command::OneWireReset as u8).unwrap();
    let status = Status::from_bits(bridge.read());
    assert!(status.presence_detect());
    assert!(!status.onewire_busy());
}

#[test]
fn rom_search_recovers_serial() {
    let mut bridge = rig(2500);
    let rom = search_rom(&mut bridge);
    assert_eq!(rom.to_le_bytes(), sensor_serial());
    assert_eq!(rom.to_le_bytes()[0], Ds18b20::family());
    assert!(OneWireCrc::validate(&rom.to_le_bytes()));
}

#[test]
fn conversion_round_trips_through_scratchpad() {
    let mut bridge = rig(2500);
    bridge.write(Command::OneWireReset as u8).unwrap();
    write_bus_byte(&mut bridge, ONEWIRE_SKIP_ROM_CMD);
    write_bus_byte(&mut bridge, START_CONVERSION);

    bridge.write(Command::OneWireReset as u8).unwrap();
    write_bus_byte(&mut bridge, ONEWIRE_SKIP_ROM_CMD);
    write_bus_byte(&mut bridge, READ_SCRATCHPAD);

    let mut scratchpad = [0u8; 9];
    for byte in scratchpad.iter_mut() {
        *byte = read_bus_byte(&mut bridge);
    }
    assert_eq!(scratchpad[..2], [0x90, 0x01]);
    assert!(OneWireCrc::validate(&scratchpad));

    let reading = ds18b20::Temperature::from_le_bytes([scratchpad[0], scratchpad[1]]);
    assert_eq!(reading.to_num::<i32>(), 25);
}

#[test]
fn negative_temperatures_encode_signed() {
    let mut bridge = rig(-5525);
    bridge.write(Command::OneWireReset as u8).unwrap();
    write_bus_byte(&mut bridge, ONEWIRE_SKIP_ROM_CMD);
    write_bus_byte(&mut bridge, START_CONVERSION);
    write_bus_byte(&mut bridge, READ_SCRATCHPAD);

    let low = read_bus_byte(&mut bridge);
    let high = read_bus_byte(&mut bridge);
    let reading = ds18b20::Temperature::from_le_bytes([low, high]);
    assert_eq!(reading.to_num::<i32>(), -55);
}

#[test]
fn power_supply_reads_external() {
    let mut bridge = rig(2500);
    bridge.write(Command::OneWireReset as u8).unwrap();
    write_bus_byte(&mut bridge, ONEWIRE_SKIP_ROM_CMD);
    write_bus_byte(&mut bridge, READ_POWER_SUPPLY);
    assert_eq!(read_bus_byte(&mut bridge), 0xff);
}

#[test]
fn channels_route_to_their_own_bus() {
    let serial_a = sensor_serial();
    let mut serial_b = [0x28, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x00];
    serial_b[7] = OneWireCrc::checksum(&serial_b[..7]);

    let bus_a = Rc::new(RefCell::new(OneWireBus::new()));
    bus_a
        .borrow_mut()
        .attach(Rc::new(RefCell::new(Ds18b20::new(serial_a))));
    let bus_b = Rc::new(RefCell::new(OneWireBus::new()));
    bus_b
        .borrow_mut()
        .attach(Rc::new(RefCell::new(Ds18b20::new(serial_b))));

    let mut bridge = Ds2482Builder::<8>::default()
        .with_channel(0, bus_a)
        .with_channel(3, bus_b)
        .build();

    assert_eq!(search_rom(&mut bridge).to_le_bytes(), serial_a);

    bridge.write(Command::ChannelSelect as u8).unwrap();
    bridge.write(0x03).unwrap();
    assert_eq!(bridge.read(), 0xa3);
    assert_eq!(search_rom(&mut bridge).to_le_bytes(), serial_b);

    // presence is latched, so clear it before probing an unwired
    // channel, which then behaves like an idle line
    bridge.write(Command::DeviceReset as u8).unwrap();
    bridge.write(Command::ChannelSelect as u8).unwrap();
    bridge.write(0x05).unwrap();
    bridge.write(Command::OneWireReset as u8).unwrap();
    assert!(!Status::from_bits(bridge.read()).presence_detect());
    assert_eq!(read_bus_byte(&mut bridge), 0x00);
}
