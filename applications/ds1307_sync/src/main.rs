//! Set a DS1307 on a Linux I2C bus from the system clock and read it back.
//!
//! Environment:
//! - `DS1307_I2C_BUS`: I2C bus number (default 1, `/dev/i2c-1`).
//! - `DS1307_UTC_OFFSET`: offset from UTC in hours (default -3).
//! - `RUST_LOG`: log filter (default `info`).

use ds1307_drivers::{
    config::{SyncConfig, DEFAULT_UTC_OFFSET_HOURS},
    hal::i2c::HalMaster,
    host_clock::StdClock,
    rtc::Ds1307,
    time_sync::sync_from_host,
};
use rppal::i2c::I2c;
use std::{env, error::Error, str::FromStr};

const DEFAULT_I2C_BUS: u8 = 1;

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| format!("invalid value for {name}: {value:?}")),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bus = env_or("DS1307_I2C_BUS", DEFAULT_I2C_BUS)?;
    let config = SyncConfig::new(env_or("DS1307_UTC_OFFSET", DEFAULT_UTC_OFFSET_HOURS)?);

    let i2c = I2c::with_bus(bus)?;
    let mut rtc = Ds1307::new(HalMaster::new(i2c));

    sync_from_host(&mut rtc, &StdClock, &config)?;

    let now = rtc.get_datetime()?;
    log::info!("RTC: {now}");

    Ok(())
}
