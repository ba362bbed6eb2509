//! Maxim DS1307 I2C real-time clock.
//!
//! Every accessor performs its own bus transfers; nothing is cached between
//! calls. Multi-register writes fail fast and are not rolled back: when
//! `set_time` or `set_date` returns an error, the registers written before the
//! failing one already hold their new values.

use super::{
    bcd_to_decimal, decimal_to_bcd, BusStage, CalendarDate, DateTime, RtcError, TimeOfDay,
};
use crate::hal::i2c::{Direction, I2cMaster};
use bitflags::bitflags;
use embedded_hal::i2c;

/// 7-bit bus address of the DS1307.
pub const DS1307_I2C_ADDRESS: u8 = 0x68;

// The registers, and the bits within each register.

const DS_SEC: u8 = 0x00; // Seconds (0-59)
const DS_MIN: u8 = 0x01; // Minutes (0-59)
const DS_HOUR: u8 = 0x02; // Hours (0-23)
const _DS_DOW: u8 = 0x03; // Day of week (1-7)
const DS_DATE: u8 = 0x04; // Day of month (1-31)
const DS_MONTH: u8 = 0x05; // Month (1-12)
const DS_YEAR: u8 = 0x06; // Year in century (0-99)
const _DS_CONTROL: u8 = 0x07; // Square-wave output control

const DS_NTIMEREGS: usize = 3;
const DS_NDATEREGS: usize = 3;

bitflags! {
    struct SecondsReg: u8 {
        const CH = 1 << 7; // Clock halt; oscillator stopped while set
    }

    struct HoursReg: u8 {
        const RESERVED = 1 << 7; // Always reads 0
        const MODE_12H = 1 << 6; // 12-hour mode (24-hour mode when clear)
    }
}

pub struct Ds1307<M> {
    i2c: M,
}

impl<M: I2cMaster> Ds1307<M> {
    pub fn new(i2c: M) -> Self {
        Self { i2c }
    }

    /// Give the bus back.
    pub fn release(self) -> M {
        self.i2c
    }

    pub fn i2c(&self) -> &M {
        &self.i2c
    }

    pub fn i2c_mut(&mut self) -> &mut M {
        &mut self.i2c
    }

    /// Write `value` to register `reg` in one transfer.
    ///
    /// A failed START or write skips the STOP. A failed STOP is reported even
    /// though the register has already been written.
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), RtcError> {
        log::trace!("DS1307: 0x{reg:02x} <- 0x{value:02x}");

        self.i2c
            .start(DS1307_I2C_ADDRESS, Direction::Write)
            .map_err(|e| bus_error(BusStage::Start, &e))?;
        self.i2c
            .write(&[reg, value])
            .map_err(|e| bus_error(BusStage::Write, &e))?;
        self.i2c
            .stop()
            .map_err(|e| bus_error(BusStage::Stop, &e))
    }

    /// Burst-read `buffer.len()` registers starting at `reg`.
    ///
    /// Once the START has succeeded the bus is always released with a STOP;
    /// the first error of the transfer is the one reported.
    pub fn read_registers(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), RtcError> {
        self.i2c
            .start(DS1307_I2C_ADDRESS, Direction::Write)
            .map_err(|e| bus_error(BusStage::Start, &e))?;

        let transfer = self.read_transfer(reg, buffer);
        let stop = self
            .i2c
            .stop()
            .map_err(|e| bus_error(BusStage::Stop, &e));

        transfer.and(stop)?;

        log::trace!("DS1307: 0x{reg:02x} -> {buffer:02x?}");
        Ok(())
    }

    fn read_transfer(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), RtcError> {
        self.i2c
            .write(&[reg])
            .map_err(|e| bus_error(BusStage::Write, &e))?;
        self.i2c
            .repeated_start(DS1307_I2C_ADDRESS, Direction::Read)
            .map_err(|e| bus_error(BusStage::Start, &e))?;
        self.i2c
            .read(buffer)
            .map_err(|e| bus_error(BusStage::Read, &e))
    }

    fn write_each(&mut self, regs: &[(u8, u8)]) -> Result<(), RtcError> {
        for &(reg, value) in regs {
            self.write_register(reg, value)?;
        }

        Ok(())
    }

    /// Set the clock. Writing the seconds register also clears the clock-halt
    /// bit, which starts the oscillator.
    ///
    /// Registers are written one by one (seconds, minutes, hours). On error
    /// the ones before the failing register keep their new values.
    pub fn set_time(&mut self, hours: u8, minutes: u8, seconds: u8) -> Result<(), RtcError> {
        let regs: [(u8, u8); DS_NTIMEREGS] = [
            (DS_SEC, decimal_to_bcd(seconds)),
            (DS_MIN, decimal_to_bcd(minutes)),
            (DS_HOUR, decimal_to_bcd(hours)),
        ];

        self.write_each(&regs)
    }

    /// Set the calendar.
    ///
    /// Registers are written one by one (day, month, year). On error the ones
    /// before the failing register keep their new values.
    pub fn set_date(&mut self, day: u8, month: u8, year: u8) -> Result<(), RtcError> {
        let regs: [(u8, u8); DS_NDATEREGS] = [
            (DS_DATE, decimal_to_bcd(day)),
            (DS_MONTH, decimal_to_bcd(month)),
            (DS_YEAR, decimal_to_bcd(year)),
        ];

        self.write_each(&regs)
    }

    /// `set_time` followed by `set_date`. Stops at the first failure.
    pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), RtcError> {
        self.set_time(datetime.hours, datetime.minutes, datetime.seconds)?;
        self.set_date(datetime.day, datetime.month, datetime.year)
    }

    /// Read the clock. The clock-halt bit and the 12/24-hour mode bit are
    /// masked off; the hours register is decoded as 24-hour time.
    pub fn get_time(&mut self) -> Result<TimeOfDay, RtcError> {
        let mut regs = [0u8; DS_NTIMEREGS];
        self.read_registers(DS_SEC, &mut regs)?;

        let [seconds, minutes, hours] = regs;
        let seconds = seconds & !SecondsReg::CH.bits();
        let hours = hours & !(HoursReg::MODE_12H | HoursReg::RESERVED).bits();

        Ok(TimeOfDay {
            hours: bcd_to_decimal(hours),
            minutes: bcd_to_decimal(minutes),
            seconds: bcd_to_decimal(seconds),
        })
    }

    /// Read the calendar.
    pub fn get_date(&mut self) -> Result<CalendarDate, RtcError> {
        let mut regs = [0u8; DS_NDATEREGS];
        self.read_registers(DS_DATE, &mut regs)?;

        let [day, month, year] = regs;

        Ok(CalendarDate {
            day: bcd_to_decimal(day),
            month: bcd_to_decimal(month),
            year: bcd_to_decimal(year),
        })
    }

    /// Read the time, then the date.
    ///
    /// The two reads are separate transfers, so a date rollover between them
    /// is not detected.
    pub fn get_datetime(&mut self) -> Result<DateTime, RtcError> {
        let result = self.get_time().and_then(|time| {
            let date = self.get_date()?;
            Ok(DateTime::from_parts(date, time))
        });

        if let Err(err) = &result {
            log::error!("Failed to read RTC date and time: {err}");
        }

        result
    }
}

fn bus_error<E: i2c::Error>(stage: BusStage, err: &E) -> RtcError {
    let err = RtcError::bus(stage, err);
    log::error!("DS1307: {err}");
    err
}
