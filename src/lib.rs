//! Driver for the Olimex MOD-IO relay and analog input board
//!
//! The board sits on an i2c bus and is driven through a handful of one byte
//! command registers (see [`registers`]). [`Device`] validates every request
//! before it reaches the bus, and [`Relay`] / [`DigitalIn`] give per-channel
//! handles onto a device.
//!
//! ```no_run
//! use modio_hal::{Device, Relay, SmBus, DEFAULT_ADDRESS};
//!
//! let board = Device::open(DEFAULT_ADDRESS, 1, SmBus::from_unit)?;
//! let relay = Relay::new(&board, 1)?;
//! relay.close_contact()?;
//! println!("analog input 3 reads {}", board.read_ain(3)?);
//! # Ok::<(), modio_hal::Error>(())
//! ```

pub mod channel;
pub use channel::{DigitalIn, Relay};

pub mod cli;

pub mod device;
pub use device::Device;

pub mod error;
pub use error::{Error, Result};

pub mod fake;
pub use fake::FakeBus;

pub mod i2c;
pub use i2c::{I2cBus, SmBus};

pub mod registers;
pub use registers::{DEFAULT_ADDRESS, DEFAULT_BUS};

pub mod transport;
pub use transport::Transport;
