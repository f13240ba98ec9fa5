//! Error types for the Bellwatch engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and playback.

use bellwatch_core::config::ConfigError;
use bellwatch_core::playback::PlaybackError;
use bellwatch_core::sequence::SequenceError;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The playback time file could not be read.
    #[error("sequence error: {source}")]
    Sequence {
        /// The underlying sequence error.
        #[from]
        source: SequenceError,
    },

    /// Playback could not be started.
    #[error("playback error: {source}")]
    Playback {
        /// The underlying playback error.
        #[from]
        source: PlaybackError,
    },
}
