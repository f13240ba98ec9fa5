//! Schedule loading and period validation.
//!
//! Schedule sources supply [`PeriodRecord`]s with raw time strings. This
//! module turns them into validated [`Period`]s. A period that fails
//! validation is not dropped: it is degraded (unparseable bounds become
//! absent) and a warning is logged, so one bad entry never takes the
//! whole schedule down with it.
//!
//! Two JSON document shapes are accepted:
//!
//! - a map from schedule kind to schedule, and
//! - the same map wrapped under a single institution key, as found in
//!   existing `schedules.json` files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bellwatch_types::{Period, PeriodRecord, Schedule, ScheduleBook, ScheduleKind, ScheduleRecord};
use chrono::NaiveTime;
use serde::Deserialize;
use tracing::{info, warn};

use crate::sequence::{self, TimeParseError};

/// Built-in schedule book used when no source is configured.
const DEFAULT_SCHEDULES_JSON: &str = include_str!("../data/default_schedules.json");

/// Errors that can occur while loading or validating schedules.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A period bound is not a valid `HH:MM` time.
    #[error("period {period:?}: invalid {bound} time: {source}")]
    MalformedTime {
        /// Name of the offending period.
        period: String,
        /// Which bound was malformed (`"start"` or `"end"`).
        bound: &'static str,
        /// The underlying parse error.
        source: TimeParseError,
    },

    /// A period ends before it starts.
    #[error("period {period:?} ends at {end} before it starts at {start}")]
    EndBeforeStart {
        /// Name of the offending period.
        period: String,
        /// Parsed start time.
        start: NaiveTime,
        /// Parsed end time.
        end: NaiveTime,
    },

    /// The schedule file could not be read.
    #[error("failed to read schedule file {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid JSON.
    #[error("failed to parse schedule JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The document is JSON but matches neither accepted shape.
    #[error("schedule document matches no known shape")]
    UnrecognizedShape,
}

fn parse_bound(
    record: &PeriodRecord,
    bound: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveTime>, ScheduleError> {
    raw.map(|text| {
        sequence::parse_wall_clock(text).map_err(|source| ScheduleError::MalformedTime {
            period: record.name.clone(),
            bound,
            source,
        })
    })
    .transpose()
}

/// Validate a period record.
///
/// Absent bounds are allowed; present bounds must be `HH:MM`, and when
/// both are present the end must not precede the start.
///
/// # Errors
///
/// Returns [`ScheduleError::MalformedTime`] or
/// [`ScheduleError::EndBeforeStart`].
pub fn validate_period(record: &PeriodRecord) -> Result<Period, ScheduleError> {
    let start = parse_bound(record, "start", record.start.as_deref())?;
    let end = parse_bound(record, "end", record.end.as_deref())?;

    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(ScheduleError::EndBeforeStart {
            period: record.name.clone(),
            start,
            end,
        });
    }

    Ok(Period::new(record.name.clone(), start, end))
}

/// Convert a record without rejecting it: unparseable bounds become absent.
pub fn degrade_period(record: &PeriodRecord) -> Period {
    let parse = |raw: Option<&str>| raw.and_then(|text| sequence::parse_wall_clock(text).ok());
    Period::new(
        record.name.clone(),
        parse(record.start.as_deref()),
        parse(record.end.as_deref()),
    )
}

/// Build a schedule from its source record, degrading invalid periods.
pub fn build_schedule(kind: ScheduleKind, record: &ScheduleRecord) -> Schedule {
    let periods = record
        .periods
        .iter()
        .map(|period| {
            validate_period(period).unwrap_or_else(|err| {
                warn!(schedule = %kind, %err, "Degrading malformed period");
                degrade_period(period)
            })
        })
        .collect();
    Schedule::new(kind, record.name.clone(), periods)
}

/// Build a book from one record per kind.
pub fn build_book(records: &BTreeMap<ScheduleKind, ScheduleRecord>) -> ScheduleBook {
    let mut book = ScheduleBook::new();
    for (&kind, record) in records {
        book.insert(build_schedule(kind, record));
    }
    book
}

/// Parse a schedule document in either accepted shape.
///
/// # Errors
///
/// Returns [`ScheduleError::Json`] for invalid JSON or
/// [`ScheduleError::UnrecognizedShape`] if neither shape matches.
pub fn parse_schedule_json(text: &str) -> Result<ScheduleBook, ScheduleError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    if let Ok(records) = BTreeMap::<ScheduleKind, ScheduleRecord>::deserialize(&value) {
        return Ok(build_book(&records));
    }

    let wrapped = BTreeMap::<String, BTreeMap<ScheduleKind, ScheduleRecord>>::deserialize(&value)
        .map_err(|_err| ScheduleError::UnrecognizedShape)?;
    let (institution, records) = wrapped
        .into_iter()
        .next()
        .ok_or(ScheduleError::UnrecognizedShape)?;
    Ok(build_book(&records).with_institution(institution))
}

/// Read and parse a schedule file.
///
/// # Errors
///
/// Returns [`ScheduleError::Io`] if the file cannot be read, or any error
/// from [`parse_schedule_json`].
pub fn load_schedule_file(path: &Path) -> Result<ScheduleBook, ScheduleError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let book = parse_schedule_json(&contents)?;
    info!(
        path = %path.display(),
        schedules = book.len(),
        periods = book.schedules().map(|s| s.periods().len()).sum::<usize>(),
        institution = book.institution.as_deref().unwrap_or("-"),
        "Schedules loaded"
    );
    Ok(book)
}

/// The built-in schedule book.
pub fn default_book() -> ScheduleBook {
    parse_schedule_json(DEFAULT_SCHEDULES_JSON).unwrap_or_else(|err| {
        warn!(%err, "Built-in schedules failed to parse, using an empty book");
        ScheduleBook::new()
    })
}
