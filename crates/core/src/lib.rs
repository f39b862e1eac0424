//! GymFlow Core Library
//!
//! Recurring class series for the GymFlow studio platform: calendar
//! expansion, per-day schedules, SQLite storage, and the engine that
//! materializes, edits and retires series.

pub mod config;
pub mod error;
pub mod invariants;
pub mod models;
pub mod schedule;
pub mod series;
pub mod storage;

pub use config::{GenerationLimits, OrphanPolicy, PropagationConfig, SchedulingConfig};
pub use error::{Error, Result};
pub use models::*;
pub use series::{SeriesCreated, SeriesRetired, SeriesService, SeriesUpdate, UpdateOptions};
pub use storage::{Database, OccurrenceRepository, SeriesRepository, Storage};
