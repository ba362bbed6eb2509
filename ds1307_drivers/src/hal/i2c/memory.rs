//! A memory-backed I2C bus with one DS1307-style register file attached.
//!
//! Writes after a write-direction START set the register pointer with the
//! first byte and store the following bytes at auto-incremented addresses.
//! Reads return bytes from the pointer onwards. The pointer wraps at the end
//! of the register file, as the chip does.
//!
//! Faults can be armed per bus phase to exercise error paths of drivers.

use super::{Direction, I2cError, I2cMaster, RWError};
use alloc::vec::Vec;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Size of the DS1307 address space (clock registers + 56 bytes of RAM).
pub const REGISTER_FILE_SIZE: usize = 64;

/// Bus phase in which an armed fault fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Start,
    RepeatedStart,
    Write,
    Read,
    Stop,
}

impl Fault {
    fn error(self) -> I2cError {
        match self {
            Fault::Start | Fault::RepeatedStart => I2cError {
                err: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
                rw: RWError::Write,
            },
            Fault::Write => I2cError {
                err: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
                rw: RWError::Write,
            },
            Fault::Read => I2cError {
                err: ErrorKind::Bus,
                rw: RWError::Read,
            },
            Fault::Stop => I2cError {
                err: ErrorKind::ArbitrationLoss,
                rw: RWError::Write,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Addressed(Direction),
}

/// A memory-backed I2C target for testing
#[derive(Debug)]
pub struct MemoryI2cDevice {
    address: u8,
    registers: [u8; REGISTER_FILE_SIZE],
    pointer: usize,
    pointer_set: bool,
    state: State,
    faults: Vec<(Fault, usize)>,
    stops: usize,
}

impl MemoryI2cDevice {
    /// Create a device answering at `address` with all registers cleared.
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; REGISTER_FILE_SIZE],
            pointer: 0,
            pointer_set: false,
            state: State::Idle,
            faults: Vec::new(),
            stops: 0,
        }
    }

    pub fn registers(&self) -> &[u8; REGISTER_FILE_SIZE] {
        &self.registers
    }

    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.registers[reg as usize % REGISTER_FILE_SIZE] = value;
    }

    /// Number of STOP conditions seen so far.
    pub fn stops(&self) -> usize {
        self.stops
    }

    /// Fail the `nth` (0-based) upcoming occurrence of `fault`'s bus phase.
    pub fn fail_on(&mut self, fault: Fault, nth: usize) {
        self.faults.push((fault, nth));
    }

    fn check(&mut self, phase: Fault) -> Result<(), I2cError> {
        let mut fired = false;

        // Every fault armed for this phase counts the occurrence.
        self.faults.retain_mut(|(fault, countdown)| {
            if *fault != phase {
                return true;
            }
            if *countdown == 0 {
                fired = true;
                return false;
            }
            *countdown -= 1;
            true
        });

        if fired {
            Err(phase.error())
        } else {
            Ok(())
        }
    }

    fn address_device(&mut self, address: u8, direction: Direction) -> Result<(), I2cError> {
        if address != self.address {
            self.state = State::Idle;
            return Err(I2cError {
                err: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
                rw: match direction {
                    Direction::Write => RWError::Write,
                    Direction::Read => RWError::Read,
                },
            });
        }

        self.state = State::Addressed(direction);
        self.pointer_set = false;
        Ok(())
    }
}

impl I2cMaster for MemoryI2cDevice {
    type Error = I2cError;

    fn start(&mut self, address: u8, direction: Direction) -> Result<(), Self::Error> {
        self.check(Fault::Start)?;
        self.address_device(address, direction)
    }

    fn repeated_start(&mut self, address: u8, direction: Direction) -> Result<(), Self::Error> {
        if self.state == State::Idle {
            return Err(I2cError {
                err: ErrorKind::Bus,
                rw: RWError::Write,
            });
        }

        self.check(Fault::RepeatedStart)?;
        self.address_device(address, direction)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.state != State::Addressed(Direction::Write) {
            return Err(I2cError {
                err: ErrorKind::Bus,
                rw: RWError::Write,
            });
        }

        self.check(Fault::Write)?;

        for &byte in bytes {
            if self.pointer_set {
                self.registers[self.pointer] = byte;
                self.pointer = (self.pointer + 1) % REGISTER_FILE_SIZE;
            } else {
                self.pointer = byte as usize % REGISTER_FILE_SIZE;
                self.pointer_set = true;
            }
        }

        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        if self.state != State::Addressed(Direction::Read) {
            return Err(I2cError {
                err: ErrorKind::Bus,
                rw: RWError::Read,
            });
        }

        self.check(Fault::Read)?;

        for byte in buffer.iter_mut() {
            *byte = self.registers[self.pointer];
            self.pointer = (self.pointer + 1) % REGISTER_FILE_SIZE;
        }

        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        // The bus is released even when the STOP is reported as failed.
        self.state = State::Idle;
        self.stops += 1;
        self.check(Fault::Stop)
    }
}
