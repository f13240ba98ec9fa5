//! Schedule resolution: which period is active at a given time of day.
//!
//! [`resolve`] is a pure, total function. Data-quality problems never
//! surface as errors; they are folded into the returned [`PeriodStatus`].
//!
//! # Evaluation order
//!
//! The first matching rule wins:
//!
//! 1. No periods at all => `NoScheduleDefined`.
//! 2. No period with both bounds => `InvalidScheduleData`.
//! 3. Before the 07:25 warning bell => `BeforeSchool`.
//! 4. Period `"1"` exists and has not started yet => `WaitingForPeriod1`.
//! 5. At or after 14:30 dismissal => `AfterSchool`.
//! 6. Inside a period (both ends inclusive) => `InPeriod`.
//! 7. Strictly between two consecutive periods => `Transition`.
//! 8. Otherwise => `NotInSession`.
//!
//! The day boundaries in steps 3 and 5 are fixed and override anything
//! the schedule's own periods suggest.

use std::collections::BTreeMap;

use bellwatch_types::{Period, PeriodStatus, ScheduleBook, ScheduleKind, TickReport, TimeSource};
use chrono::{NaiveTime, Timelike};

/// Hour and minute of the morning warning bell.
pub const WARNING_BELL: (u32, u32) = (7, 25);

/// Hour and minute of dismissal.
pub const DISMISSAL: (u32, u32) = (14, 30);

/// Name of the period whose start ends the morning wait.
const FIRST_PERIOD_NAME: &str = "1";

/// Morning warning bell as a time of day.
pub fn warning_bell() -> NaiveTime {
    wall_clock(WARNING_BELL)
}

/// Dismissal as a time of day.
pub fn dismissal() -> NaiveTime {
    wall_clock(DISMISSAL)
}

fn wall_clock((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Drop seconds and sub-seconds so comparisons happen at minute resolution.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// A complete period with its bounds unpacked.
struct Slot<'a> {
    start: NaiveTime,
    end: NaiveTime,
    period: &'a Period,
}

/// Resolve what is happening in a schedule at `at`.
pub fn resolve(periods: &[Period], at: NaiveTime) -> PeriodStatus {
    if periods.is_empty() {
        return PeriodStatus::NoScheduleDefined;
    }

    let mut slots: Vec<Slot<'_>> = periods
        .iter()
        .filter_map(|period| {
            period
                .bounds()
                .map(|(start, end)| Slot { start, end, period })
        })
        .collect();

    if slots.is_empty() {
        return PeriodStatus::InvalidScheduleData;
    }

    // Stable: periods sharing a start keep their authored order.
    slots.sort_by_key(|slot| slot.start);

    let now = truncate_to_minute(at);

    if now < warning_bell() {
        return PeriodStatus::BeforeSchool;
    }

    // Only a start is needed here; period 1 may still lack its end.
    if let Some(start_time) = periods
        .iter()
        .filter(|period| period.name == FIRST_PERIOD_NAME)
        .filter_map(|period| period.start)
        .min()
        && now < start_time
    {
        return PeriodStatus::WaitingForPeriod1 { start_time };
    }

    if now >= dismissal() {
        return PeriodStatus::AfterSchool;
    }

    if let Some(slot) = slots
        .iter()
        .find(|slot| slot.start <= now && now <= slot.end)
    {
        return PeriodStatus::InPeriod {
            label: slot.period.display_label(),
        };
    }

    for pair in slots.windows(2) {
        if let [current, next] = pair
            && current.end < now
            && now < next.start
        {
            return PeriodStatus::Transition {
                from_label: current.period.display_label(),
                to_label: next.period.display_label(),
            };
        }
    }

    PeriodStatus::NotInSession
}

/// Resolve every schedule kind in `book` at the same instant.
///
/// Kinds without a schedule resolve to [`PeriodStatus::NoScheduleDefined`].
pub fn resolve_book(book: &ScheduleBook, at: NaiveTime, source: TimeSource) -> TickReport {
    let statuses: BTreeMap<ScheduleKind, PeriodStatus> = ScheduleKind::ALL
        .iter()
        .map(|&kind| (kind, resolve(book.periods(kind), at)))
        .collect();

    TickReport {
        at,
        source,
        statuses,
    }
}
