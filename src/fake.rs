//! Transport that never touches hardware
//!
//! Writes are logged and recorded, reads are answered from a queue of scripted
//! replies (zeros once it runs dry). Lets the driver be exercised on machines
//! without a board attached.

use crate::transport::Transport;
use std::{collections::VecDeque, convert::Infallible};

/// One transaction seen by a [`FakeBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transaction {
    Write { address: u8, register: u8, value: u8 },
    Read { address: u8, register: u8, len: usize },
}

#[derive(Debug)]
pub struct FakeBus {
    bus: u32,
    address: u8,
    log: Vec<Transaction>,
    replies: VecDeque<Vec<u8>>,
}

impl FakeBus {
    pub fn new(bus: u32, address: u8) -> FakeBus {
        log::warn!("using fake i2c bus {} instead of a real one", bus);
        FakeBus { bus, address, log: Vec::new(), replies: VecDeque::new() }
    }

    /// Same shape as [`crate::SmBus::from_unit`], for use as a device factory.
    pub fn open(bus: u32, address: u8) -> Result<FakeBus, Infallible> {
        Ok(FakeBus::new(bus, address))
    }

    /// Queue the bytes the next block read returns.
    pub fn push_reply(&mut self, bytes: &[u8]) -> &mut FakeBus {
        self.replies.push_back(bytes.to_vec());
        self
    }

    pub fn with_reply(mut self, bytes: &[u8]) -> FakeBus {
        self.push_reply(bytes);
        self
    }

    pub fn bus(&self) -> u32 {
        self.bus
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// `(register, value)` for every write, in order.
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.log
            .iter()
            .filter_map(|t| match *t {
                Transaction::Write { register, value, .. } => Some((register, value)),
                Transaction::Read { .. } => None,
            })
            .collect()
    }
}

impl Transport for FakeBus {
    type Error = Infallible;

    fn address(&self) -> u8 {
        self.address
    }

    fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    fn write(&mut self, register: u8, value: u8) -> Result<(), Infallible> {
        log::debug!(
            "writing on bus {}, address 0x{:02x}, register 0x{:02x}, value 0x{:02x}",
            self.bus,
            self.address,
            register,
            value
        );
        self.log.push(Transaction::Write { address: self.address, register, value });
        Ok(())
    }

    fn read_block(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Infallible> {
        log::debug!(
            "reading {} bytes on bus {}, address 0x{:02x}, register 0x{:02x}",
            buffer.len(),
            self.bus,
            self.address,
            register
        );
        self.log.push(Transaction::Read { address: self.address, register, len: buffer.len() });
        buffer.iter_mut().for_each(|b| *b = 0);
        if let Some(reply) = self.replies.pop_front() {
            let n = reply.len().min(buffer.len());
            buffer[..n].copy_from_slice(&reply[..n]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes_against_current_address() {
        let mut bus = FakeBus::new(1, 0x48);
        bus.write(0x40, 2).unwrap();
        bus.set_address(0x30);
        bus.write(0x40, 0).unwrap();
        assert_eq!(
            bus.transactions(),
            &[
                Transaction::Write { address: 0x48, register: 0x40, value: 2 },
                Transaction::Write { address: 0x30, register: 0x40, value: 0 },
            ]
        );
        assert_eq!(bus.writes(), vec![(0x40, 2), (0x40, 0)]);
    }

    #[test]
    fn replies_are_served_in_order_then_zero() {
        let mut bus = FakeBus::new(0, 0x48).with_reply(&[0x39, 0x00]).with_reply(&[0x05]);
        let mut buf = [0xffu8; 2];
        bus.read_block(0x10, &mut buf).unwrap();
        assert_eq!(buf, [0x39, 0x00]);
        bus.read_block(0x03, &mut buf).unwrap();
        assert_eq!(buf, [0x05, 0x00]);
        bus.read_block(0x03, &mut buf).unwrap();
        assert_eq!(buf, [0, 0]);
        assert!(bus.writes().is_empty());
    }
}
