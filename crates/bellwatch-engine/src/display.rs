//! Display callback that renders tick reports to the log.
//!
//! Each tick produces a headline with the shown time and whether it is
//! simulated, followed by one line per schedule. Schedules whose data is
//! unusable are logged at `warn` so they stand out.

use bellwatch_core::playback::{DisplayCallback, PlaybackEndReason};
use bellwatch_types::{TickReport, TimeSource};
use tracing::{info, warn};

/// Format used for the shown time.
const TIME_FORMAT: &str = "%H:%M";

/// Renders reports through `tracing`.
#[derive(Debug, Default)]
pub struct LogDisplay {
    ticks_rendered: u64,
    last_end: Option<PlaybackEndReason>,
}

impl LogDisplay {
    /// Create a display that has rendered nothing yet.
    pub const fn new() -> Self {
        Self {
            ticks_rendered: 0,
            last_end: None,
        }
    }

    /// Number of reports rendered so far.
    pub const fn ticks_rendered(&self) -> u64 {
        self.ticks_rendered
    }

    /// How the most recent playback run ended, if one has.
    pub const fn last_end(&self) -> Option<PlaybackEndReason> {
        self.last_end
    }
}

/// One-line title for a report, e.g. `Bellwatch - 08:11 (TEST MODE)`.
pub fn headline(report: &TickReport) -> String {
    format!(
        "Bellwatch - {} ({})",
        report.at.format(TIME_FORMAT),
        report.mode_label()
    )
}

impl DisplayCallback for LogDisplay {
    fn on_tick(&mut self, report: &TickReport) {
        self.ticks_rendered = self.ticks_rendered.saturating_add(1);

        match report.source {
            TimeSource::Playback { position, total } => {
                info!(tick = self.ticks_rendered, position, total, "{}", headline(report));
            }
            TimeSource::Live | TimeSource::Manual => {
                info!(tick = self.ticks_rendered, "{}", headline(report));
            }
        }

        for (kind, status) in &report.statuses {
            if status.is_data_problem() {
                warn!(schedule = %kind, "{status}");
            } else {
                info!(schedule = %kind, in_period = status.is_in_period(), "{status}");
            }
        }
    }

    fn on_playback_end(&mut self, reason: PlaybackEndReason) {
        self.last_end = Some(reason);
        match reason {
            PlaybackEndReason::SequenceExhausted => {
                info!(ticks = self.ticks_rendered, "Playback complete");
            }
            PlaybackEndReason::OperatorStop => {
                info!(ticks = self.ticks_rendered, "Playback stopped");
            }
        }
    }
}
