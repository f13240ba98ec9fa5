//! Schedule resolution, virtual clock, and playback control for Bellwatch.
//!
//! Given a time of day and a set of bell schedules, this crate works out
//! what is happening in each schedule: before school, in a period,
//! between periods, and so on. For testing and demos the wall clock can be
//! replaced by a [`VirtualClock`] that is set by hand or stepped through
//! a file of times by the [`PlaybackController`].
//!
//! # Modules
//!
//! - [`cadence`] -- Validated delay between playback ticks.
//! - [`clock`] -- Virtual clock with manual, playback, and stopped modes.
//! - [`config`] -- Configuration loading from `bellwatch-config.yaml`.
//! - [`playback`] -- Timer-driven playback and the [`DisplayCallback`]
//!   seam to the presentation layer.
//! - [`resolver`] -- The pure period resolver.
//! - [`schedule`] -- Schedule loading and period validation.
//! - [`sequence`] -- Time-of-day parsing and sequence files.
//!
//! [`VirtualClock`]: clock::VirtualClock
//! [`PlaybackController`]: playback::PlaybackController
//! [`DisplayCallback`]: playback::DisplayCallback

pub mod cadence;
pub mod clock;
pub mod config;
pub mod playback;
pub mod resolver;
pub mod schedule;
pub mod sequence;
