//! Playback cadence: the delay between two playback ticks.

use std::fmt;
use std::time::Duration;

/// Shortest accepted cadence, in seconds.
pub const MIN_CADENCE_SECS: u64 = 1;

/// Longest accepted cadence, in seconds.
pub const MAX_CADENCE_SECS: u64 = 60;

/// Cadence used when none is configured.
pub const DEFAULT_CADENCE_SECS: u64 = 5;

const MILLIS_PER_SEC: u64 = 1000;

/// Errors produced when validating a cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CadenceError {
    /// The requested cadence lies outside 1 to 60 seconds.
    #[error("cadence of {millis}ms is outside the accepted range of 1-60 seconds")]
    OutOfRange {
        /// The rejected value in milliseconds.
        millis: u64,
    },
}

/// A validated delay between playback ticks, between 1 and 60 seconds.
///
/// Values outside the range are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cadence {
    millis: u64,
}

impl Cadence {
    /// Build a cadence from whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::OutOfRange`] unless `1 <= secs <= 60`.
    pub const fn from_secs(secs: u64) -> Result<Self, CadenceError> {
        Self::from_millis(secs.saturating_mul(MILLIS_PER_SEC))
    }

    /// Build a cadence from milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::OutOfRange`] unless the value lies between
    /// 1000 and 60000 inclusive.
    pub const fn from_millis(millis: u64) -> Result<Self, CadenceError> {
        let min = MIN_CADENCE_SECS.saturating_mul(MILLIS_PER_SEC);
        let max = MAX_CADENCE_SECS.saturating_mul(MILLIS_PER_SEC);
        if millis < min || millis > max {
            return Err(CadenceError::OutOfRange { millis });
        }
        Ok(Self { millis })
    }

    /// The cadence in milliseconds.
    pub const fn as_millis(self) -> u64 {
        self.millis
    }

    /// The cadence as a [`Duration`].
    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            millis: DEFAULT_CADENCE_SECS.saturating_mul(MILLIS_PER_SEC),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.millis)
    }
}
