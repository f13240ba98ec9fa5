//! Headless Bellwatch engine.
//!
//! Resolves the configured bell schedules and logs what is happening in
//! each of them. The run mode follows from the configuration:
//!
//! - `playback.file` set: play the time file at `playback.cadence_secs`
//!   until it is exhausted or Ctrl-C is pressed.
//! - `playback.manual_time` set: resolve once at that time and exit.
//! - otherwise: follow the local wall clock, re-resolving every
//!   `live.refresh_interval_secs` until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `bellwatch-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the schedule book
//! 4. Run the selected mode

mod display;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bellwatch_core::cadence::Cadence;
use bellwatch_core::clock::VirtualClock;
use bellwatch_core::config::BellwatchConfig;
use bellwatch_core::playback::{DisplayCallback, PlaybackController, PlaybackEndReason};
use bellwatch_core::{resolver, sequence};
use bellwatch_types::{ScheduleBook, TimeSource};
use chrono::NaiveTime;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::display::LogDisplay;
use crate::error::EngineError;

/// Config file looked up in the working directory.
const CONFIG_FILE: &str = "bellwatch-config.yaml";

/// How the engine obtains the time to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RunMode {
    /// Follow the local wall clock.
    Live {
        /// Delay between re-resolutions.
        refresh: Duration,
    },
    /// Resolve once at a fixed time.
    Manual {
        /// The time to resolve at.
        time: NaiveTime,
    },
    /// Play a time file.
    Playback {
        /// The time file.
        file: PathBuf,
        /// Delay between ticks.
        cadence: Cadence,
    },
}

/// Application entry point for the Bellwatch engine.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or playback cannot
/// start. Schedule problems are logged and never fatal.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("bellwatch-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Build the schedule book.
    let book = Arc::new(load_schedule_book(&config));

    // 4. Run the selected mode.
    let mode = select_mode(&config)?;
    info!(?mode, "Run mode selected");

    let display = Arc::new(Mutex::new(LogDisplay::new()));
    match mode {
        RunMode::Live { refresh } => run_live(&book, &display, refresh).await,
        RunMode::Manual { time } => {
            let mut controller = make_controller(&book, &display);
            let _ = controller.set_manual(time).await;
        }
        RunMode::Playback { file, cadence } => {
            run_playback(&book, &display, &file, cadence).await?;
        }
    }

    log_shutdown(&*display.lock().await);

    Ok(())
}

/// Log the closing summary of a run.
fn log_shutdown(shown: &LogDisplay) {
    info!(
        ticks = shown.ticks_rendered(),
        end_reason = ?shown.last_end(),
        "bellwatch-engine shutdown complete"
    );
}

/// Load `bellwatch-config.yaml` from the working directory.
///
/// Returns the path it was read from, or `None` when defaults were used.
fn load_config() -> Result<(BellwatchConfig, Option<PathBuf>), EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        let config = BellwatchConfig::from_file(config_path)?;
        Ok((config, Some(config_path.to_path_buf())))
    } else {
        let mut config = BellwatchConfig::default();
        config.apply_env_overrides();
        Ok((config, None))
    }
}

/// Build the schedule book, falling back to an empty one on error.
///
/// An empty book resolves every schedule to "No schedule defined",
/// which keeps the engine running while the problem is fixed.
fn load_schedule_book(config: &BellwatchConfig) -> ScheduleBook {
    match config.load_schedule_book() {
        Ok(book) => {
            info!(
                schedules = book.len(),
                institution = book.institution.as_deref().unwrap_or("-"),
                "Schedule book ready"
            );
            book
        }
        Err(err) => {
            warn!(%err, "Failed to load schedules, continuing with none");
            ScheduleBook::new()
        }
    }
}

/// Pick the run mode from the configuration.
fn select_mode(config: &BellwatchConfig) -> Result<RunMode, EngineError> {
    if let Some(file) = &config.playback.file {
        return Ok(RunMode::Playback {
            file: file.clone(),
            cadence: config.playback.cadence()?,
        });
    }
    if let Some(time) = config.playback.manual_time()? {
        return Ok(RunMode::Manual { time });
    }
    Ok(RunMode::Live {
        refresh: Duration::from_secs(config.live.refresh_interval_secs.max(1)),
    })
}

fn make_controller(
    book: &Arc<ScheduleBook>,
    display: &Arc<Mutex<LogDisplay>>,
) -> PlaybackController<LogDisplay> {
    let clock = Arc::new(Mutex::new(VirtualClock::new(
        NaiveTime::default(),
        Cadence::default(),
    )));
    PlaybackController::new(clock, Arc::clone(book), Arc::clone(display))
}

/// Re-resolve against the local clock until Ctrl-C.
async fn run_live(book: &ScheduleBook, display: &Mutex<LogDisplay>, refresh: Duration) {
    let mut interval = tokio::time::interval(refresh);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = chrono::Local::now().time();
                let report = resolver::resolve_book(book, now, TimeSource::Live);
                display.lock().await.on_tick(&report);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, leaving live mode");
                return;
            }
        }
    }
}

/// Play a time file until it runs out or Ctrl-C.
async fn run_playback(
    book: &Arc<ScheduleBook>,
    display: &Arc<Mutex<LogDisplay>>,
    file: &Path,
    cadence: Cadence,
) -> Result<(), EngineError> {
    let parsed = sequence::read_sequence_file(file)?;
    if !parsed.skipped.is_empty() {
        warn!(
            path = %file.display(),
            skipped = parsed.skipped.len(),
            "Some time entries were not recognized"
        );
    }

    let mut controller = make_controller(book, display);
    let _ = controller.load_parsed(parsed.times).await?;
    controller.start(cadence).await?;

    let finished = tokio::select! {
        reason = controller.wait() => reason,
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(PlaybackEndReason::SequenceExhausted) => {}
        Some(PlaybackEndReason::OperatorStop) | None => controller.stop().await,
    }
    Ok(())
}
