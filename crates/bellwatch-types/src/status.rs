//! Resolver output and the per-tick report handed to display callbacks.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schedule::ScheduleKind;

/// What is happening in a schedule at a given moment.
///
/// The [`Display`](fmt::Display) impl renders the operator-facing text
/// ("Period 3", "Period 1 → Period 2", "After School", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PeriodStatus {
    /// Earlier than the morning warning bell.
    BeforeSchool,
    /// Between the warning bell and the start of period 1.
    WaitingForPeriod1 {
        /// When period 1 begins.
        start_time: NaiveTime,
    },
    /// Inside a period.
    InPeriod {
        /// Display label of the period.
        label: String,
    },
    /// Strictly between two consecutive periods.
    Transition {
        /// Display label of the period just ended.
        from_label: String,
        /// Display label of the period about to start.
        to_label: String,
    },
    /// At or after dismissal.
    AfterSchool,
    /// During the school day but outside every known period and gap.
    NotInSession,
    /// The schedule has no periods at all.
    NoScheduleDefined,
    /// The schedule has periods but none with both bounds.
    InvalidScheduleData,
}

impl PeriodStatus {
    /// Whether the status places the moment inside a period.
    pub const fn is_in_period(&self) -> bool {
        matches!(self, Self::InPeriod { .. })
    }

    /// Whether the status reflects a problem with the schedule data.
    pub const fn is_data_problem(&self) -> bool {
        matches!(self, Self::NoScheduleDefined | Self::InvalidScheduleData)
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeSchool => f.write_str("Before School"),
            Self::WaitingForPeriod1 { start_time } => {
                write!(f, "Period 1 starts at {}", start_time.format("%H:%M"))
            }
            Self::InPeriod { label } => f.write_str(label),
            Self::Transition {
                from_label,
                to_label,
            } => write!(f, "{from_label} → {to_label}"),
            Self::AfterSchool => f.write_str("After School"),
            Self::NotInSession => f.write_str("Not in Session"),
            Self::NoScheduleDefined => f.write_str("No schedule defined"),
            Self::InvalidScheduleData => f.write_str("No valid periods defined"),
        }
    }
}

/// Where the time used for a tick came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "source", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TimeSource {
    /// The local wall clock.
    Live,
    /// A time set explicitly by the operator.
    Manual,
    /// An entry from a loaded time sequence.
    Playback {
        /// 1-based position of the entry within the sequence.
        position: usize,
        /// Number of entries in the sequence.
        total: usize,
    },
}

impl TimeSource {
    /// Whether the time is simulated rather than read from the wall clock.
    pub const fn is_simulated(self) -> bool {
        !matches!(self, Self::Live)
    }
}

/// Everything a display needs for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickReport {
    /// The time every schedule was resolved against.
    pub at: NaiveTime,
    /// Where `at` came from.
    pub source: TimeSource,
    /// One status per schedule kind.
    pub statuses: BTreeMap<ScheduleKind, PeriodStatus>,
}

impl TickReport {
    /// Status for one kind, if it was resolved.
    pub fn status(&self, kind: ScheduleKind) -> Option<&PeriodStatus> {
        self.statuses.get(&kind)
    }

    /// `"TEST MODE"` for simulated times, `"LIVE"` otherwise.
    pub const fn mode_label(&self) -> &'static str {
        if self.source.is_simulated() {
            "TEST MODE"
        } else {
            "LIVE"
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_operator_text() {
        let start_time = NaiveTime::from_hms_opt(7, 45, 0).unwrap();
        assert_eq!(
            PeriodStatus::WaitingForPeriod1 { start_time }.to_string(),
            "Period 1 starts at 07:45"
        );
        assert_eq!(
            PeriodStatus::Transition {
                from_label: String::from("Period 1"),
                to_label: String::from("Period 2"),
            }
            .to_string(),
            "Period 1 → Period 2"
        );
        assert_eq!(PeriodStatus::BeforeSchool.to_string(), "Before School");
        assert_eq!(PeriodStatus::NotInSession.to_string(), "Not in Session");
    }

    #[test]
    fn status_serializes_with_tag() {
        let status = PeriodStatus::InPeriod {
            label: String::from("Homeroom"),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "in_period");
        assert_eq!(json["label"], "Homeroom");

        let back: PeriodStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn mode_label_follows_source() {
        let mut report = TickReport {
            at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            source: TimeSource::Live,
            statuses: BTreeMap::new(),
        };
        assert_eq!(report.mode_label(), "LIVE");
        report.source = TimeSource::Playback {
            position: 1,
            total: 3,
        };
        assert_eq!(report.mode_label(), "TEST MODE");
        assert!(report.status(ScheduleKind::Regular).is_none());
    }
}
