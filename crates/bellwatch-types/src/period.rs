//! Period records as supplied by schedule sources, and the validated
//! [`Period`] the resolver works with.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A period exactly as it appears in a schedule source.
///
/// Times are kept as raw strings so that a malformed value in one period
/// never prevents the rest of the schedule from loading. Extra keys in the
/// source (such as `minutes`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PeriodRecord {
    /// Period name. Digit-only names denote numbered periods.
    pub name: String,
    /// Start time as `HH:MM`, or `null` when not yet defined.
    #[serde(default)]
    pub start: Option<String>,
    /// End time as `HH:MM`, or `null` when not yet defined.
    #[serde(default)]
    pub end: Option<String>,
}

/// A single named interval within a schedule.
///
/// Either bound may be absent, in which case the period is structurally
/// incomplete and takes no part in interval matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Period {
    /// Period name (`"1"`, `"Homeroom"`, `"Extra Help"`, ...).
    pub name: String,
    /// Wall-clock start time.
    pub start: Option<NaiveTime>,
    /// Wall-clock end time.
    pub end: Option<NaiveTime>,
}

impl Period {
    /// Create a period from its parts.
    pub fn new(name: impl Into<String>, start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// Whether the name is a period number (non-empty and all ASCII digits).
    pub fn is_numbered(&self) -> bool {
        !self.name.is_empty() && self.name.chars().all(|c| c.is_ascii_digit())
    }

    /// The label shown to users: `"Period 3"` for numbered periods, the
    /// bare name otherwise.
    pub fn display_label(&self) -> String {
        if self.is_numbered() {
            format!("Period {}", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Both bounds, if the period is complete.
    pub const fn bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Convert back to the source shape, formatting times as `HH:MM`.
    pub fn to_record(&self) -> PeriodRecord {
        PeriodRecord {
            name: self.name.clone(),
            start: self.start.map(|t| t.format("%H:%M").to_string()),
            end: self.end.map(|t| t.format("%H:%M").to_string()),
        }
    }
}
