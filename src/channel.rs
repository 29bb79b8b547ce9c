//! Single channel views onto a [`Device`]

use crate::{device::Device, error::Result, transport::Transport};

/// One relay of a board.
///
/// ```
/// use modio_hal::{Device, FakeBus, Relay};
///
/// let board = Device::new(FakeBus::new(1, 0x48))?;
/// let relay = Relay::new(&board, 1)?;
/// relay.close_contact()?;
/// assert!(relay.is_closed()?);
/// # Ok::<(), modio_hal::Error>(())
/// ```
pub struct Relay<'d, T> {
    device: &'d Device<T>,
    num: i32,
}

impl<'d, T: Transport> Relay<'d, T> {
    /// Fails with [`crate::Error::InvalidRelayNumber`] before any bus traffic.
    pub fn new(device: &'d Device<T>, num: i32) -> Result<Relay<'d, T>> {
        device.get_relay_bit(num)?;
        Ok(Relay { device, num })
    }

    #[inline(always)]
    pub fn number(&self) -> i32 {
        self.num
    }

    pub fn is_closed(&self) -> Result<bool> {
        self.device.is_relay_closed(self.num)
    }

    pub fn close_contact(&self) -> Result<()> {
        self.device.close_contact_relay(self.num)
    }

    pub fn open_contact(&self) -> Result<()> {
        self.device.open_contact_relay(self.num)
    }
}

/// One digital input of a board.
pub struct DigitalIn<'d, T> {
    device: &'d Device<T>,
    num: i32,
}

impl<'d, T: Transport> DigitalIn<'d, T> {
    pub fn new(device: &'d Device<T>, num: i32) -> Result<DigitalIn<'d, T>> {
        device.digital_in_index(num)?;
        Ok(DigitalIn { device, num })
    }

    #[inline(always)]
    pub fn number(&self) -> i32 {
        self.num
    }

    pub fn get(&self) -> Result<bool> {
        self.device.get_digital_in(self.num)
    }
}
