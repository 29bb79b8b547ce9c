//! Real i2c transport for the board
//!
//! [`I2cBus`] drives the kernel i2c device node (`/dev/i2c-N` on Linux, iic(4)'s
//! `/dev/iicN` on FreeBSD) and implements the [`embedded-hal`] blocking i2c
//! traits. [`SmBus`] binds any such bus master to a device address and turns it
//! into a [`Transport`].
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

use crate::transport::Transport;
use embedded_hal::i2c::blocking::{Write, WriteRead};
use std::{
    error, fmt,
    fs::OpenOptions,
    io,
    os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd},
};

pub struct I2cBus(RawFd);

/// An i2c wrapper around std::io::Error.
#[derive(Debug)]
pub struct I2cError(io::Error);

impl fmt::Display for I2cError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<io::Error> for I2cError {
    fn from(err: io::Error) -> I2cError {
        I2cError(err)
    }
}

impl error::Error for I2cError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_hal::i2c::Error for I2cError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::ErrorKind::*;
        match self.0.raw_os_error() {
            Some(libc::EALREADY) => Bus,
            Some(libc::EOVERFLOW) => Overrun,
            // A missing ACK shows up as EIO (or ENXIO/EREMOTEIO on Linux)
            _ => Other,
        }
    }
}

impl FromRawFd for I2cBus {
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        I2cBus(fd)
    }
}

impl IntoRawFd for I2cBus {
    fn into_raw_fd(self) -> RawFd {
        let fd = self.0;
        std::mem::forget(self);
        fd
    }
}

impl AsRawFd for I2cBus {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

impl Drop for I2cBus {
    fn drop(&mut self) {
        unsafe { libc::close(self.0) };
    }
}

impl I2cBus {
    /// Opens bus number `unit`, i.e. the bus `i2cdetect -y <unit>` shows.
    pub fn from_unit(unit: u32) -> Result<I2cBus, I2cError> {
        Self::from_path(device_path(unit))
    }

    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<I2cBus, I2cError> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map(|f| I2cBus(f.into_raw_fd()))
            .map_err(|e| e.into())
    }
}

impl Write for I2cBus {
    type Error = I2cError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        rdwr(
            self.0,
            &[i2c_msg {
                addr: wire_address(address),
                flags: M_WR,
                len: bytes.len() as u16,
                buf: bytes.as_ptr() as *mut u8,
            }],
        )
    }
}

impl WriteRead for I2cBus {
    type Error = I2cError;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        rdwr(
            self.0,
            &[
                i2c_msg {
                    addr: wire_address(address),
                    flags: M_WR | M_NOSTOP,
                    len: bytes.len() as u16,
                    buf: bytes.as_ptr() as *mut u8,
                },
                i2c_msg {
                    addr: wire_address(address),
                    flags: M_RD,
                    len: buffer.len() as u16,
                    buf: buffer.as_mut_ptr(),
                },
            ],
        )
    }
}

/// An i2c bus master bound to the address of one board.
pub struct SmBus<I> {
    i2c: I,
    address: u8,
}

impl<I> SmBus<I> {
    pub fn new(i2c: I, address: u8) -> SmBus<I> {
        SmBus { i2c, address }
    }

    pub fn into_inner(self) -> I {
        self.i2c
    }
}

impl SmBus<I2cBus> {
    pub fn from_unit(unit: u32, address: u8) -> Result<SmBus<I2cBus>, I2cError> {
        I2cBus::from_unit(unit).map(|bus| SmBus::new(bus, address))
    }
}

impl<I, E> Transport for SmBus<I>
where
    I: Write<Error = E> + WriteRead<Error = E>,
    E: error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn address(&self) -> u8 {
        self.address
    }

    fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    fn write(&mut self, register: u8, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[register, value])
    }

    fn read_block(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(self.address, &[register], buffer)
    }
}

#[cfg(target_os = "linux")]
mod sys {
    pub const I2C_RDWR: u64 = 0x0707;
    pub const M_WR: u16 = 0x0000;
    pub const M_RD: u16 = 0x0001;
    // Messages within one I2C_RDWR are already joined by repeated starts
    pub const M_NOSTOP: u16 = 0x0000;

    pub fn device_path(unit: u32) -> String {
        format!("/dev/i2c-{}", unit)
    }

    pub fn wire_address(address: u8) -> u16 {
        address as u16
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    pub const I2C_RDWR: u64 = 0x80106906;
    pub const M_WR: u16 = 0x00;
    pub const M_RD: u16 = 0x01;
    pub const M_NOSTOP: u16 = 0x02;

    pub fn device_path(unit: u32) -> String {
        format!("/dev/iic{}", unit)
    }

    // iic(4) wants the 8-bit form
    pub fn wire_address(address: u8) -> u16 {
        (address as u16) << 1
    }
}

use sys::{device_path, wire_address, I2C_RDWR, M_NOSTOP, M_RD, M_WR};

#[repr(C)]
#[allow(non_camel_case_types)]
struct i2c_msg {
    addr: u16,
    flags: u16,
    len: u16,
    buf: *mut u8,
}

#[repr(C)]
#[allow(non_camel_case_types)]
struct i2c_rdwr_data {
    msgs: *const i2c_msg,
    nmsgs: u32,
}

fn rdwr(fd: RawFd, msgs: &[i2c_msg]) -> Result<(), I2cError> {
    let mut dat = i2c_rdwr_data { msgs: msgs.as_ptr(), nmsgs: msgs.len() as u32 };
    let res = unsafe { libc::ioctl(fd, I2C_RDWR as _, &mut dat as *mut i2c_rdwr_data) };
    if res == -1 {
        return Err(I2cError(io::Error::last_os_error()));
    }
    Ok(())
}
