//! Shared type definitions for the Bellwatch schedule tracker.
//!
//! This crate holds the data model shared by the resolution engine and
//! any presentation layer built on top of it. Display-facing types flow
//! downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`period`] -- Period records from schedule sources and validated periods
//! - [`schedule`] -- Schedule kinds, schedules, and the schedule book
//! - [`status`] -- Resolver output and per-tick reports

pub mod period;
pub mod schedule;
pub mod status;

// Re-export all public types at crate root for convenience.
pub use period::{Period, PeriodRecord};
pub use schedule::{Schedule, ScheduleBook, ScheduleKind, ScheduleRecord};
pub use status::{PeriodStatus, TickReport, TimeSource};
