//! End-to-end playback scenarios against the built-in schedule book.
//!
//! Time is paused in every test, so cadences of several seconds run
//! instantly and tick counts are deterministic.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use bellwatch_core::cadence::Cadence;
use bellwatch_core::clock::{ClockError, ClockMode, VirtualClock};
use bellwatch_core::playback::{
    DisplayCallback, NoOpDisplay, PlaybackController, PlaybackEndReason, PlaybackError,
};
use bellwatch_core::schedule;
use bellwatch_core::sequence;
use bellwatch_types::{PeriodStatus, ScheduleKind, TickReport, TimeSource};
use chrono::NaiveTime;
use tokio::sync::Mutex;

#[derive(Default)]
struct Transcript {
    lines: Vec<String>,
    reports: Vec<TickReport>,
    ends: Vec<PlaybackEndReason>,
}

impl DisplayCallback for Transcript {
    fn on_tick(&mut self, report: &TickReport) {
        for (kind, status) in &report.statuses {
            self.lines
                .push(format!("{} {kind}: {status}", report.at.format("%H:%M")));
        }
        self.reports.push(report.clone());
    }

    fn on_playback_end(&mut self, reason: PlaybackEndReason) {
        self.ends.push(reason);
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn secs(n: u64) -> Cadence {
    Cadence::from_secs(n).unwrap()
}

fn controller_with<D: DisplayCallback>(display: D) -> PlaybackController<D> {
    let clock = Arc::new(Mutex::new(VirtualClock::new(hm(0, 0), Cadence::default())));
    PlaybackController::new(
        clock,
        Arc::new(schedule::default_book()),
        Arc::new(Mutex::new(display)),
    )
}

#[tokio::test(start_paused = true)]
async fn malformed_line_is_dropped_and_three_ticks_play() {
    let mut controller = controller_with(Transcript::default());
    let loaded = controller
        .load_and_start(["09:00", "09:05", "bad-time", "09:10"], secs(5))
        .await
        .unwrap();
    assert_eq!(loaded, 3);

    assert_eq!(
        controller.wait().await,
        Some(PlaybackEndReason::SequenceExhausted)
    );

    let transcript = controller.display().lock().await;
    let played: Vec<NaiveTime> = transcript.reports.iter().map(|r| r.at).collect();
    assert_eq!(played, vec![hm(9, 0), hm(9, 5), hm(9, 10)]);
    assert_eq!(transcript.ends, vec![PlaybackEndReason::SequenceExhausted]);

    let last = &transcript.reports[2];
    assert_eq!(
        last.source,
        TimeSource::Playback {
            position: 3,
            total: 3
        }
    );
    assert_eq!(
        last.status(ScheduleKind::Regular),
        Some(&PeriodStatus::InPeriod {
            label: String::from("Period 3")
        })
    );
}

#[tokio::test(start_paused = true)]
async fn whole_sequence_takes_one_cadence_per_entry() {
    let mut controller = controller_with(NoOpDisplay);
    let started = tokio::time::Instant::now();
    let _ = controller
        .load_and_start(["08:00", "08:30", "09:00", "09:30"], secs(5))
        .await
        .unwrap();
    let _ = controller.wait().await;

    // Four ticks at 0, 5, 10 and 15s, then completion is detected at 20s.
    assert_eq!(started.elapsed(), Duration::from_secs(20));
    assert_eq!(controller.clock().lock().await.mode(), ClockMode::Stopped);
    assert_eq!(controller.clock().lock().await.current_time(), hm(9, 30));
}

#[tokio::test(start_paused = true)]
async fn second_start_leaves_first_timer_running() {
    let mut controller = controller_with(Transcript::default());
    let _ = controller
        .load_and_start(["08:00", "08:05", "08:10"], secs(5))
        .await
        .unwrap();

    assert!(matches!(
        controller.start(secs(5)).await,
        Err(PlaybackError::AlreadyRunning)
    ));

    assert_eq!(
        controller.wait().await,
        Some(PlaybackEndReason::SequenceExhausted)
    );
    assert_eq!(controller.display().lock().await.reports.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_mid_sequence_freezes_the_clock() {
    let mut controller = controller_with(Transcript::default());
    let _ = controller
        .load_and_start(["08:00", "08:05", "08:10", "08:15"], secs(2))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    controller.stop().await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    let transcript = controller.display().lock().await;
    assert_eq!(transcript.reports.len(), 2);
    assert_eq!(transcript.ends, vec![PlaybackEndReason::OperatorStop]);
    drop(transcript);

    let clock = controller.clock().lock().await;
    assert_eq!(clock.current_time(), hm(8, 5));
    assert_eq!(clock.remaining(), 2);
}

#[tokio::test(start_paused = true)]
async fn slowing_down_mid_run_keeps_position() {
    let mut controller = controller_with(Transcript::default());
    let _ = controller
        .load_and_start(["10:00", "10:01", "10:02"], secs(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(controller.display().lock().await.reports.len(), 2);

    controller.reconfigure(secs(20)).await;
    tokio::time::sleep(Duration::from_secs(19)).await;
    assert_eq!(controller.display().lock().await.reports.len(), 2);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let transcript = controller.display().lock().await;
    assert_eq!(transcript.reports.len(), 3);
    assert_eq!(transcript.reports[2].at, hm(10, 2));
}

#[tokio::test(start_paused = true)]
async fn manual_time_resolves_every_schedule() {
    let mut controller = controller_with(Transcript::default());
    let report = controller.set_manual(hm(8, 11)).await;

    assert_eq!(report.source, TimeSource::Manual);
    assert_eq!(report.mode_label(), "TEST MODE");
    assert_eq!(
        report.status(ScheduleKind::Regular),
        Some(&PeriodStatus::Transition {
            from_label: String::from("Period 1"),
            to_label: String::from("Period 2"),
        })
    );
    assert_eq!(
        report.status(ScheduleKind::TwoHourDelay),
        Some(&PeriodStatus::WaitingForPeriod1 {
            start_time: hm(9, 25)
        })
    );
    assert_eq!(
        report.status(ScheduleKind::Homeroom),
        Some(&PeriodStatus::InPeriod {
            label: String::from("Period 1")
        })
    );

    let transcript = controller.display().lock().await;
    assert_eq!(
        transcript.lines,
        vec![
            "08:11 Regular: Period 1 → Period 2",
            "08:11 2-Hour Delay: Period 1 starts at 09:25",
            "08:11 Homeroom: Period 1",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn empty_sequence_is_surfaced_and_playback_does_not_start() {
    let mut controller = controller_with(Transcript::default());
    let result = controller
        .load_and_start(["", "half past nine", "   "], secs(5))
        .await;

    assert!(matches!(
        result,
        Err(PlaybackError::Clock {
            source: ClockError::EmptySequence { skipped: 1 }
        })
    ));
    assert!(!controller.is_running());
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(controller.display().lock().await.reports.is_empty());
}

#[tokio::test(start_paused = true)]
async fn sequence_file_plays_mixed_formats() {
    let path = std::env::temp_dir().join(format!(
        "bellwatch-sequence-{}.txt",
        std::process::id()
    ));
    std::fs::write(&path, "07:10\n\n07:30:15\n02:45 PM\nlunch\n").unwrap();

    let parsed = sequence::read_sequence_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(parsed.skipped.len(), 1);
    assert_eq!(parsed.skipped[0].line, 5);

    let mut controller = controller_with(Transcript::default());
    let _ = controller.load_parsed(parsed.times).await.unwrap();
    controller.start(secs(1)).await.unwrap();
    let _ = controller.wait().await;

    let transcript = controller.display().lock().await;
    let regular: Vec<String> = transcript
        .reports
        .iter()
        .map(|r| r.status(ScheduleKind::Regular).unwrap().to_string())
        .collect();
    assert_eq!(regular, vec!["Before School", "Period 1", "After School"]);
    // The report keeps the entry's seconds; resolution ignores them.
    assert_eq!(
        transcript.reports[1].at,
        NaiveTime::from_hms_opt(7, 30, 15).unwrap()
    );
}
