//! Byte-register access to a single board on a bus

use std::error;

/// What the driver needs from a bus: single byte register writes and block
/// reads, both aimed at the address the transport currently targets.
pub trait Transport {
    type Error: error::Error + Send + Sync + 'static;

    fn address(&self) -> u8;

    /// Retarget subsequent transactions. Does not talk to the bus.
    fn set_address(&mut self, address: u8);

    fn write(&mut self, register: u8, value: u8) -> Result<(), Self::Error>;

    /// Select `register`, then read `buffer.len()` bytes with a repeated start.
    fn read_block(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;
}
