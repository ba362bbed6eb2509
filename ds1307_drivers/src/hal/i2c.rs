//! Blocking I2C master with explicit bus framing.
//!
//! Register-level drivers in this crate talk to the bus through [`I2cMaster`],
//! which exposes the START / repeated START / STOP conditions separately so
//! that a failure can be attributed to the phase of the transfer in which it
//! happened. [`HalMaster`] provides that capability on top of any
//! transaction-level `embedded_hal::i2c::I2c` implementation.

use alloc::vec::Vec;
use core::fmt;
use embedded_hal::i2c::{self, ErrorKind};

pub mod memory;

/// Direction bit sent together with the slave address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Write,
    Read,
}

/// A blocking I2C master.
///
/// The driver owning an `I2cMaster` has exclusive use of the bus while one of
/// its operations is running. Sharing a bus between several drivers has to be
/// serialized by the caller.
pub trait I2cMaster {
    type Error: i2c::Error;

    /// Generate a START condition and address the 7-bit `address`.
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), Self::Error>;

    /// Generate a repeated START condition without releasing the bus.
    fn repeated_start(&mut self, address: u8, direction: Direction) -> Result<(), Self::Error>;

    /// Send `bytes` to the addressed device.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Fill `buffer` with bytes from the addressed device.
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Generate a STOP condition and release the bus.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// I2C errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cError {
    pub err: ErrorKind,
    pub rw: RWError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RWError {
    Read,
    Write,
}

impl i2c::Error for I2cError {
    fn kind(&self) -> ErrorKind {
        self.err
    }
}

impl fmt::Display for I2cError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rw {
            RWError::Read => write!(f, "read error: {}", self.err),
            RWError::Write => write!(f, "write error: {}", self.err),
        }
    }
}

/// Errors of [`HalMaster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalMasterError<E> {
    /// The underlying bus reported an error.
    Bus(E),
    /// Calls arrived out of order, e.g. `write` without a preceding `start`.
    Framing,
}

impl<E: i2c::Error> i2c::Error for HalMasterError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Bus(err) => err.kind(),
            Self::Framing => ErrorKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Addressed for writing; bytes are buffered until STOP or a repeated START.
    Writing,
    /// Addressed for reading; the next `read` performs the transfer.
    Reading,
    /// The transfer has been issued. Only STOP or another START may follow.
    Done,
}

/// [`I2cMaster`] on top of a transaction-level `embedded_hal` bus.
///
/// Written bytes are buffered and leave the bus at STOP through
/// `I2c::write`, so a NACK during a write is reported by `stop`. A write
/// followed by a repeated START for reading from the same address is issued
/// as a single `I2c::write_read`.
pub struct HalMaster<I> {
    i2c: I,
    address: u8,
    state: State,
    pending: Vec<u8>,
}

impl<I: i2c::I2c> HalMaster<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            address: 0,
            state: State::Idle,
            pending: Vec::new(),
        }
    }

    /// Give the underlying bus back.
    pub fn release(self) -> I {
        self.i2c
    }

    fn begin(&mut self, address: u8, direction: Direction) {
        self.address = address;
        self.state = match direction {
            Direction::Write => State::Writing,
            Direction::Read => State::Reading,
        };
    }

    fn flush(&mut self) -> Result<(), HalMasterError<I::Error>> {
        if self.state != State::Writing {
            return Ok(());
        }

        let result = self.i2c.write(self.address, &self.pending);
        self.pending.clear();
        self.state = State::Done;
        result.map_err(HalMasterError::Bus)
    }
}

impl<I: i2c::I2c> I2cMaster for HalMaster<I> {
    type Error = HalMasterError<I::Error>;

    fn start(&mut self, address: u8, direction: Direction) -> Result<(), Self::Error> {
        // A new START abandons whatever an aborted transfer left behind.
        self.pending.clear();
        self.begin(address, direction);
        Ok(())
    }

    fn repeated_start(&mut self, address: u8, direction: Direction) -> Result<(), Self::Error> {
        match self.state {
            State::Idle => return Err(HalMasterError::Framing),
            State::Writing if direction == Direction::Read && address == self.address => (),
            _ => self.flush()?,
        }

        self.begin(address, direction);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.state != State::Writing {
            return Err(HalMasterError::Framing);
        }

        self.pending.extend_from_slice(bytes);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        if self.state != State::Reading {
            return Err(HalMasterError::Framing);
        }

        let result = if self.pending.is_empty() {
            self.i2c.read(self.address, buffer)
        } else {
            self.i2c.write_read(self.address, &self.pending, buffer)
        };

        self.pending.clear();
        self.state = State::Done;
        result.map_err(HalMasterError::Bus)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        if self.state == State::Idle {
            return Err(HalMasterError::Framing);
        }

        let result = self.flush();
        self.state = State::Idle;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use embedded_hal::i2c::{Error, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const ADDR: u8 = 0x68;

    #[test]
    fn test_buffered_write_leaves_at_stop() {
        let mut mock = I2cMock::new(&[I2cTrans::write(ADDR, vec![0x01, 0x59])]);
        let mut master = HalMaster::new(mock.clone());

        master.start(ADDR, Direction::Write).unwrap();
        master.write(&[0x01]).unwrap();
        master.write(&[0x59]).unwrap();
        master.stop().unwrap();

        mock.done();
    }

    #[test]
    fn test_repeated_start_becomes_write_read() {
        let mut mock = I2cMock::new(&[I2cTrans::write_read(
            ADDR,
            vec![0x04],
            vec![0x19, 0x10, 0x26],
        )]);
        let mut master = HalMaster::new(mock.clone());

        let mut buf = [0u8; 3];
        master.start(ADDR, Direction::Write).unwrap();
        master.write(&[0x04]).unwrap();
        master.repeated_start(ADDR, Direction::Read).unwrap();
        master.read(&mut buf).unwrap();
        master.stop().unwrap();

        assert_eq!(buf, [0x19, 0x10, 0x26]);
        mock.done();
    }

    #[test]
    fn test_plain_read() {
        let mut mock = I2cMock::new(&[I2cTrans::read(ADDR, vec![0xaa, 0x55])]);
        let mut master = HalMaster::new(mock.clone());

        let mut buf = [0u8; 2];
        master.start(ADDR, Direction::Read).unwrap();
        master.read(&mut buf).unwrap();
        master.stop().unwrap();

        assert_eq!(buf, [0xaa, 0x55]);
        mock.done();
    }

    #[test]
    fn test_nack_is_reported_by_stop() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let mut mock = I2cMock::new(&[I2cTrans::write(ADDR, vec![0x00, 0x00]).with_error(nack)]);
        let mut master = HalMaster::new(mock.clone());

        master.start(ADDR, Direction::Write).unwrap();
        master.write(&[0x00, 0x00]).unwrap();
        let err = master.stop().unwrap_err();

        assert_eq!(err, HalMasterError::Bus(nack));
        assert_eq!(err.kind(), nack);
        mock.done();
    }

    #[test]
    fn test_out_of_order_calls() {
        let mut mock = I2cMock::new(&[]);
        let mut master = HalMaster::new(mock.clone());
        let mut buf = [0u8; 1];

        assert_eq!(master.write(&[0x00]), Err(HalMasterError::Framing));
        assert_eq!(master.stop(), Err(HalMasterError::Framing));
        assert_eq!(
            master.repeated_start(ADDR, Direction::Read),
            Err(HalMasterError::Framing)
        );

        master.start(ADDR, Direction::Write).unwrap();
        assert_eq!(master.read(&mut buf), Err(HalMasterError::Framing));
        assert_eq!(HalMasterError::<ErrorKind>::Framing.kind(), ErrorKind::Other);

        // Abandoned transfer, nothing reaches the bus.
        master.start(ADDR, Direction::Read).unwrap();
        assert_eq!(master.write(&[0x00]), Err(HalMasterError::Framing));

        mock.done();
    }
}
