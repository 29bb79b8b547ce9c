//! MOD-IO command register map
//!
//! Every value here goes on the wire as-is and has to match the board firmware.

use std::ops::RangeInclusive;

/// Configure pin direction.
pub const SET_TRIS: u8 = 0x01;
/// Set the output latch.
pub const SET_LAT: u8 = 0x02;
/// Read the digital inputs (2 byte block, low byte carries the inputs).
pub const DIGITAL_IN: u8 = 0x03;
/// Write the relay bitmask.
pub const RELAY_WRITE: u8 = 0x40;
/// Read the relay bitmask back. Not every firmware answers it.
pub const RELAY_READ: u8 = 0x80;
/// Analog input N is read through `AIN_READ_BASE + (N - 1)`.
pub const AIN_READ_BASE: u8 = 0x10;
/// Reassign the bus address of the board.
pub const CHANGE_ADDRESS: u8 = 0xB0;

/// Address the board answers on out of the box.
pub const DEFAULT_ADDRESS: u8 = 0x48;
/// Bus the board usually sits on (Raspberry Pi rev. 2 and later).
pub const DEFAULT_BUS: u32 = 1;

/// Accepted by `set_relays`. Only two relays exist, yet 4 (a third bit) passes.
pub const RELAY_MASK_RANGE: RangeInclusive<i32> = 0..=4;
pub const RELAY_NUMBERS: RangeInclusive<i32> = 1..=2;
pub const ANALOG_INPUTS: RangeInclusive<i32> = 1..=8;
pub const DIGITAL_INPUTS: RangeInclusive<i32> = 0..=3;
pub const ADDRESSES: RangeInclusive<i32> = 0..=255;

/// Byte written to an analog command register to start a conversion.
pub const AIN_TRIGGER: u8 = 0x1;

/// Command register for analog input `ain`, which must already be validated.
#[inline(always)]
pub fn ain_command(ain: u8) -> u8 {
    AIN_READ_BASE + (ain - 1)
}
