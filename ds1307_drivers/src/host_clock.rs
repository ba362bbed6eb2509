//! Sources of the host's wall-clock time.

use crate::rtc::RtcError;

pub trait HostClock {
    /// Seconds since the Unix epoch (UTC).
    fn now(&self) -> Result<i64, RtcError>;
}

/// A clock stuck at a timestamp obtained elsewhere (NTP, GPS, a test).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    timestamp: Option<i64>,
}

impl FixedClock {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
        }
    }

    /// A clock that never has the time.
    pub fn unavailable() -> Self {
        Self { timestamp: None }
    }
}

impl HostClock for FixedClock {
    fn now(&self) -> Result<i64, RtcError> {
        self.timestamp.ok_or(RtcError::ClockUnavailable)
    }
}

/// The operating system's clock.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdClock;

#[cfg(feature = "std")]
impl HostClock for StdClock {
    fn now(&self) -> Result<i64, RtcError> {
        let elapsed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|_| RtcError::ClockUnavailable)?;

        i64::try_from(elapsed.as_secs()).map_err(|_| RtcError::ClockUnconvertible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock::new(1_700_000_000).now(), Ok(1_700_000_000));
        assert_eq!(
            FixedClock::unavailable().now(),
            Err(RtcError::ClockUnavailable)
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_std_clock_is_after_2020() {
        assert!(StdClock.now().unwrap() > 1_577_836_800);
    }
}
