//! Errors raised by the MOD-IO driver

use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bus device node could not be opened (missing i2c driver or module).
    #[error("i2c bus {bus} is not available, is the i2c driver loaded?")]
    TransportUnavailable {
        bus: u32,
        #[source]
        source: BoxError,
    },

    /// A bus transaction was not acknowledged.
    #[error("no answer from device at address 0x{address:02x}")]
    DeviceUnreachable {
        address: u8,
        #[source]
        source: BoxError,
    },

    #[error("invalid relay value {0}: must be between 0 and 4")]
    InvalidRelayValue(i32),

    #[error("invalid relay number {0}: must be 1 or 2")]
    InvalidRelayNumber(i32),

    #[error("invalid analog input {0}: must be between 1 and 8")]
    InvalidAnalogInput(i32),

    #[error("invalid digital input {0}: must be between 0 and 3")]
    InvalidDigitalInput(i32),

    #[error("invalid address {0}: must be between 0 and 255")]
    InvalidAddress(i32),
}

impl Error {
    pub(crate) fn unreachable<E>(address: u8, err: E) -> Error
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::DeviceUnreachable { address, source: Box::new(err) }
    }

    /// True for argument validation failures, which never reach the bus.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Error::TransportUnavailable { .. } | Error::DeviceUnreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn validation_errors_are_flagged() {
        assert!(Error::InvalidRelayValue(5).is_invalid_input());
        assert!(Error::InvalidAddress(-1).is_invalid_input());
        let err = Error::unreachable(0x48, io::Error::new(io::ErrorKind::Other, "nack"));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn unreachable_keeps_source() {
        let err = Error::unreachable(0x48, io::Error::new(io::ErrorKind::Other, "nack"));
        assert_eq!(err.to_string(), "no answer from device at address 0x48");
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("nack"));
    }
}
