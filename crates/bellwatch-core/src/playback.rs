//! Playback controller: drives the virtual clock on a timer.
//!
//! The controller owns a background task that repeatedly:
//!
//! 1. advances the shared [`VirtualClock`] by one entry,
//! 2. resolves every schedule at the new time, and
//! 3. hands the resulting [`TickReport`] to the [`DisplayCallback`],
//!
//! then sleeps for the clock's current [`Cadence`]. The first tick fires
//! immediately on [`start`](PlaybackController::start).
//!
//! # Control
//!
//! - **Stop** aborts the task and waits for it to finish, so a queued
//!   tick is revoked rather than merely ignored.
//! - **Reconfigure** stores the new cadence on the clock and wakes the
//!   task through a `watch` channel; the pending wait is rescheduled from
//!   the moment of the change and no extra tick fires.
//! - **Completion** ends the task with
//!   [`PlaybackEndReason::SequenceExhausted`], which is distinct from an
//!   operator stop.

use std::sync::Arc;

use bellwatch_types::{ScheduleBook, TickReport, TimeSource};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cadence::Cadence;
use crate::clock::{ClockError, ClockMode, ClockSignal, VirtualClock};
use crate::resolver;

/// A virtual clock shared between the controller and its playback task.
pub type SharedClock = Arc<Mutex<VirtualClock>>;

/// Errors surfaced to callers of the [`PlaybackController`].
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// A playback task is already active; stop it first.
    #[error("playback is already running")]
    AlreadyRunning,

    /// `start` was called before a sequence was loaded.
    #[error("no time sequence is loaded")]
    NoSequenceLoaded,

    /// The clock rejected the operation.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Why a playback run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackEndReason {
    /// Every entry of the sequence was played.
    SequenceExhausted,
    /// The operator stopped playback.
    OperatorStop,
}

/// Receives resolved statuses; implemented by the presentation layer.
pub trait DisplayCallback: Send + 'static {
    /// Called once per tick with the statuses of every schedule.
    fn on_tick(&mut self, report: &TickReport);

    /// Called once when a playback run ends.
    fn on_playback_end(&mut self, reason: PlaybackEndReason) {
        let _ = reason;
    }
}

/// A display that discards everything.
pub struct NoOpDisplay;

impl DisplayCallback for NoOpDisplay {
    fn on_tick(&mut self, _report: &TickReport) {}
}

/// Drives a [`VirtualClock`] through a loaded sequence on a timer.
pub struct PlaybackController<D: DisplayCallback> {
    clock: SharedClock,
    schedules: Arc<ScheduleBook>,
    display: Arc<Mutex<D>>,
    cadence_changed: watch::Sender<()>,
    task: Option<JoinHandle<PlaybackEndReason>>,
}

impl<D: DisplayCallback> PlaybackController<D> {
    /// Create an idle controller.
    pub fn new(clock: SharedClock, schedules: Arc<ScheduleBook>, display: Arc<Mutex<D>>) -> Self {
        let (cadence_changed, _) = watch::channel(());
        Self {
            clock,
            schedules,
            display,
            cadence_changed,
            task: None,
        }
    }

    /// The shared clock.
    pub const fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// The shared display.
    pub const fn display(&self) -> &Arc<Mutex<D>> {
        &self.display
    }

    /// Whether a playback task is active.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// The cadence currently in effect, as held by the clock.
    pub async fn cadence(&self) -> Cadence {
        self.clock.lock().await.cadence()
    }

    /// Stop any running playback and load a new sequence.
    ///
    /// Returns the number of usable entries.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Clock`] wrapping
    /// [`ClockError::EmptySequence`] if no entry parses; playback does not
    /// start in that case.
    pub async fn load_sequence<'a, I>(&mut self, lines: I) -> Result<usize, PlaybackError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.stop().await;
        let loaded = self.clock.lock().await.load_sequence(lines)?;
        Ok(loaded)
    }

    /// Load an already-parsed sequence, stopping any running playback.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Clock`] if `times` is empty.
    pub async fn load_parsed(&mut self, times: Vec<NaiveTime>) -> Result<usize, PlaybackError> {
        self.stop().await;
        let loaded = self.clock.lock().await.load_parsed(times)?;
        Ok(loaded)
    }

    /// Load a sequence and immediately start playing it.
    ///
    /// # Errors
    ///
    /// Returns any error from [`load_sequence`](Self::load_sequence) or
    /// [`start`](Self::start).
    pub async fn load_and_start<'a, I>(
        &mut self,
        lines: I,
        cadence: Cadence,
    ) -> Result<usize, PlaybackError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let loaded = self.load_sequence(lines).await?;
        self.start(cadence).await?;
        Ok(loaded)
    }

    /// Start playing the loaded sequence, first tick immediately.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::AlreadyRunning`] if a task is active (it
    /// keeps running unaffected), or [`PlaybackError::NoSequenceLoaded`]
    /// if the clock is not in file playback.
    pub async fn start(&mut self, cadence: Cadence) -> Result<(), PlaybackError> {
        if self.is_running() {
            return Err(PlaybackError::AlreadyRunning);
        }

        {
            let mut clock = self.clock.lock().await;
            if clock.mode() != ClockMode::FilePlayback {
                return Err(PlaybackError::NoSequenceLoaded);
            }
            clock.set_cadence(cadence);
            info!(
                entries = clock.sequence_len(),
                remaining = clock.remaining(),
                cadence_ms = cadence.as_millis(),
                "Playback starting"
            );
        }

        let task = playback_loop(
            Arc::clone(&self.clock),
            Arc::clone(&self.schedules),
            Arc::clone(&self.display),
            self.cadence_changed.subscribe(),
        );
        self.task = Some(tokio::spawn(task));
        Ok(())
    }

    /// Stop playback. Idempotent.
    ///
    /// When this returns, no further tick will fire. The display is told
    /// about an [`PlaybackEndReason::OperatorStop`] only if playback was
    /// actually running.
    pub async fn stop(&mut self) {
        let was_running = self.is_running();

        {
            let mut clock = self.clock.lock().await;
            if clock.mode() == ClockMode::FilePlayback {
                clock.stop();
            }
        }

        if let Some(task) = self.task.take() {
            task.abort();
            // Wait for the abort to land so a queued tick cannot fire late.
            let _ = task.await;
        }

        if was_running {
            info!("Playback stopped by operator");
            self.display
                .lock()
                .await
                .on_playback_end(PlaybackEndReason::OperatorStop);
        }
    }

    /// Change the cadence for subsequent ticks without losing position.
    pub async fn reconfigure(&self, cadence: Cadence) {
        let previous = {
            let mut clock = self.clock.lock().await;
            let previous = clock.cadence();
            clock.set_cadence(cadence);
            previous
        };
        self.cadence_changed.send_replace(());
        debug!(
            previous_ms = previous.as_millis(),
            cadence_ms = cadence.as_millis(),
            running = self.is_running(),
            "Cadence reconfigured"
        );
    }

    /// Stop playback, set a manual time, and show it.
    pub async fn set_manual(&mut self, time: NaiveTime) -> TickReport {
        self.stop().await;
        self.clock.lock().await.set_manual(time);
        let report = resolver::resolve_book(&self.schedules, time, TimeSource::Manual);
        self.display.lock().await.on_tick(&report);
        report
    }

    /// Wait for the running playback to end on its own.
    ///
    /// Returns `None` if nothing was running. Dropping the returned future
    /// leaves the task in place, so it can still be stopped afterwards.
    pub async fn wait(&mut self) -> Option<PlaybackEndReason> {
        let task = self.task.as_mut()?;
        let outcome = task.await;
        self.task = None;
        match outcome {
            Ok(reason) => Some(reason),
            Err(err) => {
                warn!(%err, "Playback task did not complete");
                Some(PlaybackEndReason::OperatorStop)
            }
        }
    }
}

/// Body of the playback task.
async fn playback_loop<D: DisplayCallback>(
    clock: SharedClock,
    schedules: Arc<ScheduleBook>,
    display: Arc<Mutex<D>>,
    mut cadence_changed: watch::Receiver<()>,
) -> PlaybackEndReason {
    loop {
        let signal = clock.lock().await.advance();

        match signal {
            Ok(ClockSignal::Tick {
                time,
                position,
                total,
            }) => {
                let report = resolver::resolve_book(
                    &schedules,
                    time,
                    TimeSource::Playback { position, total },
                );
                debug!(position, total, at = %time.format("%H:%M:%S"), "Playback tick");
                display.lock().await.on_tick(&report);
            }
            Ok(ClockSignal::PlaybackComplete) => {
                info!("Playback complete, reached end of sequence");
                display
                    .lock()
                    .await
                    .on_playback_end(PlaybackEndReason::SequenceExhausted);
                return PlaybackEndReason::SequenceExhausted;
            }
            Err(err) => {
                // Someone moved the clock out of playback (manual set or stop).
                debug!(%err, "Playback task exiting");
                return PlaybackEndReason::OperatorStop;
            }
        }

        wait_for_next_tick(&clock, &mut cadence_changed).await;
    }
}

/// Sleep for one cadence, restarting the wait whenever the cadence changes.
async fn wait_for_next_tick(clock: &SharedClock, cadence_changed: &mut watch::Receiver<()>) {
    let mut deadline = deadline_after(clock.lock().await.cadence());
    loop {
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => return,
            changed = cadence_changed.changed() => {
                if changed.is_err() {
                    // Controller dropped; finish the current wait and let
                    // the clock decide whether to continue.
                    tokio::time::sleep_until(deadline).await;
                    return;
                }
                deadline = deadline_after(clock.lock().await.cadence());
            }
        }
    }
}

fn deadline_after(cadence: Cadence) -> Instant {
    let now = Instant::now();
    now.checked_add(cadence.as_duration()).unwrap_or(now)
}
