//! Time-of-day parsing and playback sequence files.
//!
//! A sequence file is a newline-delimited list of times. Each entry may
//! use any of the [`ACCEPTED_FORMATS`]; formats are tried in order and the
//! first that accepts the entry wins. Blank lines are ignored and entries
//! no format accepts are skipped.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use tracing::debug;

/// `strftime` patterns accepted for sequence entries, in priority order.
pub const ACCEPTED_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M:%S %p"];

/// Pattern used for period bounds in schedule sources.
pub const WALL_CLOCK_FORMAT: &str = "%H:%M";

/// A time string that no accepted format recognizes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized time {input:?}: expected HH:MM, HH:MM:SS, hh:MM AM/PM or hh:MM:SS AM/PM")]
pub struct TimeParseError {
    /// The rejected input, trimmed.
    pub input: String,
}

/// Errors that can occur when reading a sequence file.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// The file could not be read.
    #[error("failed to read time sequence {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Parse a time of day in any of the [`ACCEPTED_FORMATS`].
///
/// # Errors
///
/// Returns [`TimeParseError`] if no format accepts the input.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = input.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TimeParseError {
            input: trimmed.to_owned(),
        })
}

/// Parse a period bound, which must be 24-hour `HH:MM`.
///
/// # Errors
///
/// Returns [`TimeParseError`] if the input is not `HH:MM`.
pub fn parse_wall_clock(input: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, WALL_CLOCK_FORMAT).map_err(|_err| TimeParseError {
        input: trimmed.to_owned(),
    })
}

/// An entry dropped while parsing a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// 1-based line number within the source.
    pub line: usize,
    /// The rejected text, trimmed.
    pub text: String,
}

/// The usable times of a sequence plus the entries that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSequence {
    /// Parsed times in source order.
    pub times: Vec<NaiveTime>,
    /// Non-blank entries that no format accepted.
    pub skipped: Vec<SkippedEntry>,
}

impl ParsedSequence {
    /// Whether no entry parsed.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Parse sequence entries, dropping blank and unrecognized ones.
pub fn parse_sequence<'a, I>(lines: I) -> ParsedSequence
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parsed = ParsedSequence::default();
    for (index, raw) in lines.into_iter().enumerate() {
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        match parse_time_of_day(text) {
            Ok(time) => parsed.times.push(time),
            Err(err) => {
                let line = index.saturating_add(1);
                debug!(line, %err, "Skipping sequence entry");
                parsed.skipped.push(SkippedEntry {
                    line,
                    text: err.input,
                });
            }
        }
    }
    parsed
}

/// Read and parse a sequence file.
///
/// # Errors
///
/// Returns [`SequenceError::Io`] if the file cannot be read. Unparseable
/// entries are not errors; they are reported in [`ParsedSequence::skipped`].
pub fn read_sequence_file(path: &Path) -> Result<ParsedSequence, SequenceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SequenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_sequence(contents.lines()))
}
