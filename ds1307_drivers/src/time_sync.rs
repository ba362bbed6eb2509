//! Program the RTC from the host clock.

use crate::{
    config::SyncConfig,
    hal::i2c::I2cMaster,
    host_clock::HostClock,
    rtc::{DateTime, Ds1307, RtcError},
};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Host time shifted by the configured UTC offset, as RTC fields.
///
/// The shift is done on the full timestamp, so crossing midnight also moves
/// the month and year when needed. Times outside 2000-2099 cannot be held by
/// the two-digit year register and are rejected.
pub fn host_local_time<C: HostClock + ?Sized>(
    clock: &C,
    config: &SyncConfig,
) -> Result<DateTime, RtcError> {
    let utc = OffsetDateTime::from_unix_timestamp(clock.now()?)
        .map_err(|_| RtcError::ClockUnconvertible)?;
    let local = utc
        .checked_add(Duration::hours(config.get_utc_offset_hours() as i64))
        .ok_or(RtcError::ClockUnconvertible)?;

    DateTime::try_from(PrimitiveDateTime::new(local.date(), local.time()))
}

/// Set the RTC to the host's current time in the configured zone.
///
/// Time is written before the date; see [`Ds1307::set_datetime`] for what is
/// left on the chip when a write fails. Returns the value programmed.
pub fn sync_from_host<M, C>(
    rtc: &mut Ds1307<M>,
    clock: &C,
    config: &SyncConfig,
) -> Result<DateTime, RtcError>
where
    M: I2cMaster,
    C: HostClock + ?Sized,
{
    let local = host_local_time(clock, config).inspect_err(|err| {
        log::error!("Failed to get the host time: {err}");
    })?;

    log::info!(
        "{} Date: {:02}/{:02}/{:02} Time: {:02}:{:02}:{:02}",
        config.zone_label(),
        local.day,
        local.month,
        local.year,
        local.hours,
        local.minutes,
        local.seconds
    );

    match rtc.set_datetime(&local) {
        Ok(()) => {
            log::info!("Date and Time set successfully!");
            Ok(local)
        }
        Err(err) => {
            log::error!("Failed to set date and time!");
            Err(err)
        }
    }
}
