//! Settings of the host-time synchronizer.

use core::fmt;

/// Offset from UTC applied when programming the RTC, in hours (UTC-3).
pub const DEFAULT_UTC_OFFSET_HOURS: i8 = -3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    utc_offset_hours: i8,
}

impl SyncConfig {
    pub fn new(utc_offset_hours: i8) -> Self {
        Self { utc_offset_hours }
    }

    pub fn get_utc_offset_hours(&self) -> i8 {
        self.utc_offset_hours
    }

    /// Zone label for log output, e.g. `UTC-3`.
    pub fn zone_label(&self) -> ZoneLabel {
        ZoneLabel(self.utc_offset_hours)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_HOURS)
    }
}

pub struct ZoneLabel(i8);

impl fmt::Display for ZoneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "UTC"),
            h if h > 0 => write!(f, "UTC+{h}"),
            h => write!(f, "UTC{h}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_sync_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.get_utc_offset_hours(), -3);
        assert_eq!(config.zone_label().to_string(), "UTC-3");
    }

    #[test]
    fn test_zone_label() {
        assert_eq!(SyncConfig::new(0).zone_label().to_string(), "UTC");
        assert_eq!(SyncConfig::new(9).zone_label().to_string(), "UTC+9");
        assert_eq!(SyncConfig::new(-10).zone_label().to_string(), "UTC-10");
    }
}
