//! Validated configuration scalars
//!
//! `Volume` and `PollInterval` can only be built inside their domains, so the
//! shared store never holds an out-of-range value.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building configuration values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Volume {0} is outside 0-100 percent")]
    VolumePercent(f64),

    #[error("Volume level {0} is outside 0.0-1.0")]
    VolumeLevel(f32),

    #[error("Interval {0}ms is outside {min}-{max}ms", min = PollInterval::MIN_MILLIS, max = PollInterval::MAX_MILLIS)]
    Interval(i64),
}

/// Enforced volume as a scalar in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Volume(f32);

impl Volume {
    pub const MIN_PERCENT: i64 = 0;
    pub const MAX_PERCENT: i64 = 100;

    /// Build from an integer percentage (the control-message form)
    pub fn from_percent(percent: i64) -> Result<Self, ConfigError> {
        if !(Self::MIN_PERCENT..=Self::MAX_PERCENT).contains(&percent) {
            return Err(ConfigError::VolumePercent(percent as f64));
        }
        Ok(Self(percent as f32 / 100.0))
    }

    /// Build from a startup percentage such as `95.5`
    ///
    /// The fraction is truncated, so the enforced level always matches the
    /// whole percent reported to control clients.
    pub fn from_percent_f64(percent: f64) -> Result<Self, ConfigError> {
        // NaN fails the range check
        if !(0.0..=100.0).contains(&percent) {
            return Err(ConfigError::VolumePercent(percent));
        }
        Self::from_percent(percent.trunc() as i64)
    }

    /// Build from a device scalar
    pub fn from_scalar(level: f32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(ConfigError::VolumeLevel(level));
        }
        Ok(Self(level))
    }

    /// The scalar handed to the device
    pub fn scalar(self) -> f32 {
        self.0
    }

    /// Whole percent, rounded, as shown to control clients
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }

    pub(super) fn to_bits(self) -> u32 {
        self.0.to_bits()
    }

    /// Only for patterns produced by `to_bits`
    pub(super) fn from_bits(bits: u32) -> Self {
        Self(f32::from_bits(bits))
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0 * 100.0)
    }
}

/// Delay between enforcement ticks, in [100, 10000] milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct PollInterval(u64);

impl PollInterval {
    pub const MIN_MILLIS: i64 = 100;
    pub const MAX_MILLIS: i64 = 10_000;

    pub fn from_millis(millis: i64) -> Result<Self, ConfigError> {
        if !(Self::MIN_MILLIS..=Self::MAX_MILLIS).contains(&millis) {
            return Err(ConfigError::Interval(millis));
        }
        Ok(Self(millis as u64))
    }

    pub fn millis(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Only for values produced by `millis`
    pub(super) fn from_stored(millis: u64) -> Self {
        Self(millis)
    }
}

impl TryFrom<i64> for PollInterval {
    type Error = ConfigError;

    fn try_from(millis: i64) -> Result<Self, Self::Error> {
        Self::from_millis(millis)
    }
}

impl From<PollInterval> for u64 {
    fn from(interval: PollInterval) -> Self {
        interval.0
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_from_percent_bounds() {
        assert_eq!(Volume::from_percent(0).unwrap().scalar(), 0.0);
        assert_eq!(Volume::from_percent(100).unwrap().scalar(), 1.0);
        assert_eq!(Volume::from_percent(-1), Err(ConfigError::VolumePercent(-1.0)));
        assert_eq!(Volume::from_percent(101), Err(ConfigError::VolumePercent(101.0)));
    }

    #[test]
    fn test_volume_from_fractional_percent() {
        let volume = Volume::from_percent_f64(95.5).unwrap();
        assert_eq!(volume, Volume::from_percent(95).unwrap());
        assert_eq!(volume.percent(), 95);

        assert_eq!(Volume::from_percent_f64(99.99).unwrap().percent(), 99);
        assert_eq!(Volume::from_percent_f64(100.0).unwrap().scalar(), 1.0);

        assert!(Volume::from_percent_f64(100.01).is_err());
        assert!(Volume::from_percent_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_volume_percent_rounds() {
        assert_eq!(Volume::from_scalar(0.496).unwrap().percent(), 50);
        assert_eq!(Volume::from_scalar(0.333).unwrap().percent(), 33);
    }

    #[test]
    fn test_volume_from_scalar_rejects_out_of_range() {
        assert!(Volume::from_scalar(-0.01).is_err());
        assert!(Volume::from_scalar(1.01).is_err());
        assert!(Volume::from_scalar(f32::NAN).is_err());
    }

    #[test]
    fn test_interval_bounds() {
        assert_eq!(PollInterval::from_millis(100).unwrap().millis(), 100);
        assert_eq!(PollInterval::from_millis(10_000).unwrap().millis(), 10_000);
        assert_eq!(PollInterval::from_millis(99), Err(ConfigError::Interval(99)));
        assert_eq!(PollInterval::from_millis(10_001), Err(ConfigError::Interval(10_001)));
    }

    #[test]
    fn test_interval_duration() {
        let interval = PollInterval::from_millis(3000).unwrap();
        assert_eq!(interval.as_duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_interval_error_message() {
        let err = PollInterval::from_millis(5).unwrap_err();
        assert_eq!(err.to_string(), "Interval 5ms is outside 100-10000ms");
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<PollInterval>("50").is_err());
        assert!(serde_json::from_str::<PollInterval>("-1").is_err());
        assert_eq!(serde_json::from_str::<PollInterval>("500").unwrap().millis(), 500);
    }
}
