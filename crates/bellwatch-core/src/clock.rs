//! Virtual clock used in place of the wall clock for testing and demos.
//!
//! The clock holds the current simulated time of day. It is either set
//! explicitly (manual mode) or stepped through a loaded sequence of times
//! (file playback). It never advances on its own; the
//! [`PlaybackController`](crate::playback::PlaybackController) drives
//! [`advance`](VirtualClock::advance) on a timer.
//!
//! # Modes
//!
//! - `Manual` -- time set once, does not advance.
//! - `FilePlayback` -- steps through the loaded sequence on each advance.
//! - `Stopped` -- no advancing; the last time is retained.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cadence::Cadence;
use crate::sequence;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The playback source contained no usable entries.
    #[error("time sequence contains no usable entries ({skipped} skipped)")]
    EmptySequence {
        /// Number of non-blank entries that failed to parse.
        skipped: usize,
    },

    /// `advance` was called while no sequence is playing.
    #[error("clock is not in file playback (mode: {mode:?})")]
    NotInPlayback {
        /// The mode the clock was in.
        mode: ClockMode,
    },
}

/// Operating mode of the [`VirtualClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockMode {
    /// Time set explicitly; does not auto-advance.
    Manual,
    /// Advancing through a loaded sequence.
    FilePlayback,
    /// Not advancing; retains the last time.
    Stopped,
}

/// Outcome of a single [`VirtualClock::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    /// The clock moved to the next entry.
    Tick {
        /// The new current time.
        time: NaiveTime,
        /// 1-based position of the entry within the sequence.
        position: usize,
        /// Number of entries in the sequence.
        total: usize,
    },
    /// Every entry has been played; the clock is now stopped.
    PlaybackComplete,
}

/// Simulated time-of-day source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualClock {
    /// Current simulated time.
    current_time: NaiveTime,

    /// Current operating mode.
    mode: ClockMode,

    /// Delay between playback ticks.
    cadence: Cadence,

    /// Parsed sequence being played back.
    sequence: Vec<NaiveTime>,

    /// Index of the next entry to play.
    cursor: usize,
}

impl VirtualClock {
    /// Create a stopped clock showing `start`.
    pub const fn new(start: NaiveTime, cadence: Cadence) -> Self {
        Self {
            current_time: start,
            mode: ClockMode::Stopped,
            cadence,
            sequence: Vec::new(),
            cursor: 0,
        }
    }

    /// Set the time explicitly, abandoning any loaded sequence.
    pub fn set_manual(&mut self, time: NaiveTime) {
        if self.mode == ClockMode::FilePlayback {
            debug!(cursor = self.cursor, "Manual time cancels playback");
        }
        self.sequence.clear();
        self.cursor = 0;
        self.current_time = time;
        self.mode = ClockMode::Manual;
    }

    /// Load a playback sequence and switch to file playback.
    ///
    /// Blank and unrecognized entries are dropped. On success the cursor
    /// is reset to the first entry and the number of usable entries is
    /// returned. On failure the clock is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::EmptySequence`] if no entry parses.
    pub fn load_sequence<'a, I>(&mut self, lines: I) -> Result<usize, ClockError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let parsed = sequence::parse_sequence(lines);
        if parsed.is_empty() {
            return Err(ClockError::EmptySequence {
                skipped: parsed.skipped.len(),
            });
        }
        self.load_times(parsed.times, parsed.skipped.len());
        Ok(self.sequence.len())
    }

    /// Load an already-parsed, non-empty sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::EmptySequence`] if `times` is empty.
    pub fn load_parsed(&mut self, times: Vec<NaiveTime>) -> Result<usize, ClockError> {
        if times.is_empty() {
            return Err(ClockError::EmptySequence { skipped: 0 });
        }
        self.load_times(times, 0);
        Ok(self.sequence.len())
    }

    fn load_times(&mut self, times: Vec<NaiveTime>, skipped: usize) {
        info!(entries = times.len(), skipped, "Time sequence loaded");
        self.sequence = times;
        self.cursor = 0;
        self.mode = ClockMode::FilePlayback;
    }

    /// Step to the next entry of the loaded sequence.
    ///
    /// Once every entry has been played the next call returns
    /// [`ClockSignal::PlaybackComplete`] and stops the clock.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::NotInPlayback`] unless the clock is in
    /// [`ClockMode::FilePlayback`].
    pub fn advance(&mut self) -> Result<ClockSignal, ClockError> {
        if self.mode != ClockMode::FilePlayback {
            return Err(ClockError::NotInPlayback { mode: self.mode });
        }

        let Some(&time) = self.sequence.get(self.cursor) else {
            self.mode = ClockMode::Stopped;
            return Ok(ClockSignal::PlaybackComplete);
        };

        self.cursor = self.cursor.saturating_add(1);
        self.current_time = time;
        Ok(ClockSignal::Tick {
            time,
            position: self.cursor,
            total: self.sequence.len(),
        })
    }

    /// Stop advancing, keeping the current time.
    pub const fn stop(&mut self) {
        self.mode = ClockMode::Stopped;
    }

    /// Change the delay between playback ticks.
    pub const fn set_cadence(&mut self, cadence: Cadence) {
        self.cadence = cadence;
    }

    /// Current simulated time.
    pub const fn current_time(&self) -> NaiveTime {
        self.current_time
    }

    /// Current mode.
    pub const fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Current cadence.
    pub const fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Index of the next entry to play.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of entries in the loaded sequence.
    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    /// Number of entries not yet played.
    pub fn remaining(&self) -> usize {
        self.sequence.len().saturating_sub(self.cursor)
    }
}
