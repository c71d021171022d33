#![forbid(unsafe_code)]

//! Core domain model and business logic for fitgen.
//!
//! This crate provides:
//! - Domain types (profiles, exercises, workouts, progress entries)
//! - Exercise catalog management
//! - Workout generation
//! - Session clock and workout session state machine
//! - Persistence (progress log, CSV rollup, workout store, profile)
//! - History and progress statistics

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod generator;
pub mod clock;
pub mod session;
pub mod wal;
pub mod store;
pub mod profile;
pub mod csv_rollup;
pub mod history;
pub mod stats;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, CatalogHandle, ExerciseSource};
pub use config::Config;
pub use generator::{GenerationReport, WorkoutPlanner};
pub use clock::{format_clock, ClockEvent, ClockState, SessionClock};
pub use session::{Feedback, Phase, WorkoutSession};
pub use wal::{JsonlProgressLog, ProgressRecorder};
pub use store::{JsonWorkoutStore, WorkoutStore};
pub use profile::ProfileStore;
pub use history::load_recent_entries;
pub use stats::{Achievement, ProgressSummary};
