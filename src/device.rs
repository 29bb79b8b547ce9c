//! High level handle to one MOD-IO board

use crate::{
    error::{Error, Result},
    registers::*,
    transport::Transport,
};
use std::cell::{Cell, RefCell};

/// A MOD-IO board reachable through a [`Transport`].
///
/// The relay state is never read back from the board: [`Device::get_relays`]
/// reports the last mask successfully written. Construction writes 0, so every
/// relay starts open.
///
/// All operations take `&self` so that several [`crate::Relay`] and
/// [`crate::DigitalIn`] views can share one device. A `Device` is not `Sync`.
pub struct Device<T> {
    transport: RefCell<T>,
    relays: Cell<u8>,
    digital_ins: Cell<[bool; 4]>,
}

impl<T: Transport> Device<T> {
    /// Opens bus `bus` through `factory`, then opens every relay.
    ///
    /// ```no_run
    /// use modio_hal::{Device, SmBus, DEFAULT_ADDRESS, DEFAULT_BUS};
    ///
    /// let board = Device::open(DEFAULT_ADDRESS, DEFAULT_BUS, SmBus::from_unit)?;
    /// board.close_contact_relay(1)?;
    /// # Ok::<(), modio_hal::Error>(())
    /// ```
    pub fn open<F, E>(address: u8, bus: u32, factory: F) -> Result<Device<T>>
    where
        F: FnOnce(u32, u8) -> std::result::Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let transport = factory(bus, address)
            .map_err(|e| Error::TransportUnavailable { bus, source: Box::new(e) })?;
        Device::new(transport)
    }

    /// Takes over an already open transport and opens every relay.
    pub fn new(transport: T) -> Result<Device<T>> {
        let dev = Device {
            transport: RefCell::new(transport),
            relays: Cell::new(0),
            digital_ins: Cell::new([false; 4]),
        };
        dev.set_relays(0)?;
        Ok(dev)
    }

    pub fn into_transport(self) -> T {
        self.transport.into_inner()
    }

    pub fn address(&self) -> u8 {
        self.transport.borrow().address()
    }

    fn write(&self, register: u8, value: u8) -> Result<()> {
        let mut transport = self.transport.borrow_mut();
        log::debug!("0x{:02x}: write 0x{:02x} to 0x{:02x}", transport.address(), value, register);
        transport
            .write(register, value)
            .map_err(|e| Error::unreachable(transport.address(), e))
    }

    fn read_block(&self, register: u8, buffer: &mut [u8]) -> Result<()> {
        let mut transport = self.transport.borrow_mut();
        transport
            .read_block(register, buffer)
            .map_err(|e| Error::unreachable(transport.address(), e))?;
        log::debug!("0x{:02x}: read {:02x?} from 0x{:02x}", transport.address(), buffer, register);
        Ok(())
    }

    /// Writes the whole relay bitmask and returns it.
    ///
    /// Accepts 0 through 4. The board only has two relays, so 4 addresses a bit
    /// that drives nothing; the range is kept as the firmware tooling has it.
    pub fn set_relays(&self, mask: i32) -> Result<u8> {
        if !RELAY_MASK_RANGE.contains(&mask) {
            return Err(Error::InvalidRelayValue(mask));
        }
        let mask = mask as u8;
        self.write(RELAY_WRITE, mask)?;
        self.relays.set(mask);
        Ok(mask)
    }

    #[inline(always)]
    pub fn get_relays(&self) -> u8 {
        self.relays.get()
    }

    /// Bit of `relay` in the relay mask. Validates the relay number.
    pub fn get_relay_bit(&self, relay: i32) -> Result<u8> {
        if !RELAY_NUMBERS.contains(&relay) {
            return Err(Error::InvalidRelayNumber(relay));
        }
        Ok(1 << (relay - 1))
    }

    pub fn is_relay_closed(&self, relay: i32) -> Result<bool> {
        Ok(self.get_relay_bit(relay)? & self.get_relays() != 0)
    }

    pub fn close_contact_relay(&self, relay: i32) -> Result<()> {
        let bit = self.get_relay_bit(relay)?;
        self.set_relays((self.get_relays() | bit) as i32)?;
        Ok(())
    }

    pub fn open_contact_relay(&self, relay: i32) -> Result<()> {
        let bit = self.get_relay_bit(relay)?;
        self.set_relays((self.get_relays() & !bit) as i32)?;
        Ok(())
    }

    /// Reads the relay mask back from the board.
    ///
    /// Only some firmware revisions answer this. The cached state is left alone.
    #[cfg(feature = "relay-read")]
    pub fn read_relays(&self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_block(RELAY_READ, &mut buf)?;
        Ok(buf[0] & 0x0f)
    }

    /// Samples analog input `ain` (1 to 8).
    pub fn read_ain(&self, ain: i32) -> Result<u16> {
        if !ANALOG_INPUTS.contains(&ain) {
            return Err(Error::InvalidAnalogInput(ain));
        }
        let command = ain_command(ain as u8);
        self.write(command, AIN_TRIGGER)?;
        let mut buf = [0u8; 2];
        self.read_block(command, &mut buf)?;
        Ok(u16::from(buf[0]) | u16::from(buf[1]) << 8)
    }

    /// Reads all four digital inputs from the board and caches them.
    pub fn get_digital_ins(&self) -> Result<[bool; 4]> {
        let mut buf = [0u8; 2];
        self.read_block(DIGITAL_IN, &mut buf)?;
        let ins = [buf[0] & 1 != 0, buf[0] & 2 != 0, buf[0] & 4 != 0, buf[0] & 8 != 0];
        self.digital_ins.set(ins);
        Ok(ins)
    }

    /// Current level of digital input `input` (0 to 3), read fresh from the board.
    pub fn get_digital_in(&self, input: i32) -> Result<bool> {
        let index = self.digital_in_index(input)?;
        self.get_digital_ins()?;
        Ok(self.digital_ins.get()[index])
    }

    /// Validates a digital input number, yielding its index in the input cache.
    pub fn digital_in_index(&self, input: i32) -> Result<usize> {
        if !DIGITAL_INPUTS.contains(&input) {
            return Err(Error::InvalidDigitalInput(input));
        }
        Ok(input as usize)
    }

    /// Moves the board to `address` and retargets this handle.
    ///
    /// Other handles to the board keep the old address and stop working.
    pub fn change_address(&self, address: i32) -> Result<()> {
        if !ADDRESSES.contains(&address) {
            return Err(Error::InvalidAddress(address));
        }
        let address = address as u8;
        self.write(CHANGE_ADDRESS, address)?;
        let mut transport = self.transport.borrow_mut();
        log::info!("board at 0x{:02x} moved to 0x{:02x}", transport.address(), address);
        transport.set_address(address);
        Ok(())
    }
}
