//! Real-Time Clock (RTC) driver support

use core::fmt;
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource};
use time::{Date, Month, PrimitiveDateTime, Time};

pub mod ds1307;

pub use ds1307::Ds1307;

/// First year of the century kept by two-digit RTC year registers.
pub const CENTURY_BASE: i32 = 2000;

/// A date and time as stored by the RTC.
///
/// A plain snapshot of the registers. Fields are not validated beyond what
/// the BCD encoding can represent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTime {
    pub day: u8,     // 1-31
    pub month: u8,   // 1-12
    pub year: u8,    // 0-99, years since CENTURY_BASE
    pub hours: u8,   // 0-23 (24-hour format)
    pub minutes: u8, // 0-59
    pub seconds: u8, // 0-59
}

/// Contents of the seconds, minutes and hours registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

/// Contents of the date, month and year registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarDate {
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl DateTime {
    pub fn new(day: u8, month: u8, year: u8, hours: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            day,
            month,
            year,
            hours,
            minutes,
            seconds,
        }
    }

    pub fn from_parts(date: CalendarDate, time: TimeOfDay) -> Self {
        Self::new(
            date.day,
            date.month,
            date.year,
            time.hours,
            time.minutes,
            time.seconds,
        )
    }

    pub fn time(&self) -> TimeOfDay {
        TimeOfDay {
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
        }
    }

    pub fn date(&self) -> CalendarDate {
        CalendarDate {
            day: self.day,
            month: self.month,
            year: self.year,
        }
    }

    /// Interpret the snapshot as a calendar date and time in `CENTURY_BASE`'s century.
    ///
    /// Returns `None` if the registers hold an impossible date or time.
    pub fn to_primitive(&self) -> Option<PrimitiveDateTime> {
        let date = Date::from_calendar_date(
            CENTURY_BASE + self.year as i32,
            Month::try_from(self.month).ok()?,
            self.day,
        )
        .ok()?;
        let time = Time::from_hms(self.hours, self.minutes, self.seconds).ok()?;

        Some(PrimitiveDateTime::new(date, time))
    }
}

impl TryFrom<PrimitiveDateTime> for DateTime {
    type Error = RtcError;

    /// Fails for years the two-digit year register cannot hold.
    fn try_from(value: PrimitiveDateTime) -> Result<Self, Self::Error> {
        let year = value.year() - CENTURY_BASE;
        if !(0..100).contains(&year) {
            return Err(RtcError::ClockUnconvertible);
        }

        Ok(Self::new(
            value.day(),
            u8::from(value.month()),
            year as u8,
            value.hour(),
            value.minute(),
            value.second(),
        ))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:02} {:02}:{:02}:{:02}",
            self.day, self.month, self.year, self.hours, self.minutes, self.seconds
        )
    }
}

/// Phase of an I2C transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStage {
    Start,
    Write,
    Read,
    Stop,
}

impl fmt::Display for BusStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Write => write!(f, "write"),
            Self::Read => write!(f, "read"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcError {
    /// The bus failed in `stage`.
    Bus { stage: BusStage, kind: ErrorKind },
    /// The host clock could not provide the current time.
    ClockUnavailable,
    /// The host time could not be expressed as RTC calendar fields.
    ClockUnconvertible,
}

impl RtcError {
    /// Bus error raised at `stage`.
    ///
    /// A NACK names its own phase: an address NACK means the START was not
    /// acknowledged and a data NACK means a written byte was refused, whatever
    /// call surfaced it. Buses that batch a whole transfer into one call report
    /// such NACKs late.
    pub(crate) fn bus<E: i2c::Error>(stage: BusStage, err: &E) -> Self {
        let kind = err.kind();
        let stage = match kind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => BusStage::Start,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => BusStage::Write,
            _ => stage,
        };

        Self::Bus { stage, kind }
    }
}

impl fmt::Display for RtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus { stage, kind } => write!(f, "I2C {stage} failed: {kind}"),
            Self::ClockUnavailable => write!(f, "failed to get the current time."),
            Self::ClockUnconvertible => {
                write!(f, "failed to convert the current time to calendar fields.")
            }
        }
    }
}

impl core::error::Error for RtcError {}

/// Pack a value in 0-99 into two BCD digits. Larger values give garbage.
#[inline]
pub fn decimal_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Unpack two BCD digits. Nibbles above 9 are not rejected.
#[inline]
pub fn bcd_to_decimal(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_bcd_round_trip() {
        for v in 0..=99u8 {
            assert_eq!(bcd_to_decimal(decimal_to_bcd(v)), v);
        }
    }

    #[test]
    fn test_bcd_nibbles() {
        for v in 0..=99u8 {
            let bcd = decimal_to_bcd(v);
            assert_eq!(bcd >> 4, v / 10);
            assert_eq!(bcd & 0x0f, v % 10);
        }

        assert_eq!(decimal_to_bcd(59), 0x59);
        assert_eq!(bcd_to_decimal(0x23), 23);
    }

    #[test]
    fn test_display() {
        let dt = DateTime::new(5, 3, 25, 7, 4, 9);
        assert_eq!(dt.to_string(), "05/03/25 07:04:09");
    }

    #[test]
    fn test_parts() {
        let dt = DateTime::new(31, 12, 99, 23, 59, 58);
        assert_eq!(
            dt.date(),
            CalendarDate {
                day: 31,
                month: 12,
                year: 99
            }
        );
        assert_eq!(DateTime::from_parts(dt.date(), dt.time()), dt);
    }

    #[test]
    fn test_primitive_conversion() {
        let dt = DateTime::new(29, 2, 24, 12, 30, 0);
        let primitive = dt.to_primitive().unwrap();
        assert_eq!(primitive.year(), 2024);
        assert_eq!(primitive.month(), Month::February);
        assert_eq!(DateTime::try_from(primitive), Ok(dt));

        // 2023 is not a leap year.
        assert!(DateTime::new(29, 2, 23, 0, 0, 0).to_primitive().is_none());
        assert!(DateTime::default().to_primitive().is_none());

        let out_of_century = PrimitiveDateTime::new(
            Date::from_calendar_date(1999, Month::December, 31).unwrap(),
            Time::MIDNIGHT,
        );
        assert_eq!(
            DateTime::try_from(out_of_century),
            Err(RtcError::ClockUnconvertible)
        );
    }

    #[test]
    fn test_error_display() {
        let err = RtcError::Bus {
            stage: BusStage::Stop,
            kind: ErrorKind::Bus,
        };
        assert!(err.to_string().starts_with("I2C stop failed"));
    }

    #[test]
    fn test_nack_names_its_stage() {
        let address = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let data = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);
        let unknown = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown);

        assert_eq!(
            RtcError::bus(BusStage::Read, &address),
            RtcError::Bus {
                stage: BusStage::Start,
                kind: address
            }
        );
        assert_eq!(
            RtcError::bus(BusStage::Stop, &data),
            RtcError::Bus {
                stage: BusStage::Write,
                kind: data
            }
        );
        assert_eq!(
            RtcError::bus(BusStage::Read, &unknown),
            RtcError::Bus {
                stage: BusStage::Read,
                kind: unknown
            }
        );
        assert_eq!(
            RtcError::bus(BusStage::Stop, &ErrorKind::ArbitrationLoss),
            RtcError::Bus {
                stage: BusStage::Stop,
                kind: ErrorKind::ArbitrationLoss
            }
        );
    }
}
