//! Schedules, schedule kinds, and the book that holds one schedule per kind.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::period::{Period, PeriodRecord};

/// The operating mode a schedule belongs to.
///
/// Serialized names match the keys used by existing `schedules.json`
/// files; the older `*_schedule` spellings are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ScheduleKind {
    /// The normal bell schedule.
    #[serde(alias = "regular_schedule")]
    Regular,
    /// The schedule used on two-hour delayed openings.
    TwoHourDelay,
    /// The schedule with an extended homeroom block.
    #[serde(alias = "homeroom_schedule")]
    Homeroom,
}

impl ScheduleKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 3] = [Self::Regular, Self::TwoHourDelay, Self::Homeroom];

    /// Short title shown next to the schedule's status.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::TwoHourDelay => "2-Hour Delay",
            Self::Homeroom => "Homeroom",
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A schedule as it appears in a schedule source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Optional descriptive name ("SHS Bell Schedule (2024-2025)").
    #[serde(default)]
    pub name: Option<String>,
    /// Periods in authored order.
    #[serde(default)]
    pub periods: Vec<PeriodRecord>,
}

/// The full ordered set of periods for one operating mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Which operating mode this schedule describes.
    pub kind: ScheduleKind,
    /// Optional descriptive name.
    pub name: Option<String>,
    /// Periods in authored order. Not assumed to be sorted.
    periods: Vec<Period>,
}

impl Schedule {
    /// Create a schedule from its periods.
    pub const fn new(kind: ScheduleKind, name: Option<String>, periods: Vec<Period>) -> Self {
        Self {
            kind,
            name,
            periods,
        }
    }

    /// Create a schedule with no periods.
    pub const fn empty(kind: ScheduleKind) -> Self {
        Self::new(kind, None, Vec::new())
    }

    /// The periods in authored order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Replace the whole period sequence at once.
    pub fn replace_periods(&mut self, periods: Vec<Period>) {
        self.periods = periods;
    }
}

/// One schedule per [`ScheduleKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBook {
    /// Name of the institution the schedules belong to, if known.
    pub institution: Option<String>,
    schedules: BTreeMap<ScheduleKind, Schedule>,
}

impl ScheduleBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the institution name.
    #[must_use]
    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    /// Insert or replace the schedule for its kind.
    pub fn insert(&mut self, schedule: Schedule) {
        self.schedules.insert(schedule.kind, schedule);
    }

    /// Look up the schedule for a kind.
    pub fn get(&self, kind: ScheduleKind) -> Option<&Schedule> {
        self.schedules.get(&kind)
    }

    /// Periods for a kind; empty when the kind has no schedule.
    pub fn periods(&self, kind: ScheduleKind) -> &[Period] {
        self.schedules
            .get(&kind)
            .map(Schedule::periods)
            .unwrap_or_default()
    }

    /// Atomically replace the periods of one schedule, creating it if
    /// missing.
    pub fn replace_periods(&mut self, kind: ScheduleKind, periods: Vec<Period>) {
        self.schedules
            .entry(kind)
            .or_insert_with(|| Schedule::empty(kind))
            .replace_periods(periods);
    }

    /// Iterate over the defined schedules in kind order.
    pub fn schedules(&self) -> impl Iterator<Item = &Schedule> {
        self.schedules.values()
    }

    /// Number of defined schedules.
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// Whether no schedule is defined.
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}
