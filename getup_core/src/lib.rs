#![forbid(unsafe_code)]

//! Core exercise-analysis engine for GetUp.
//!
//! This crate provides:
//! - Domain types (joints, snapshots, feedback, exercises, sessions)
//! - Joint geometry and per-exercise posture analysis
//! - The rep state machine and the workout session controller
//! - A single-consumer frame pipeline
//! - Persistence (session WAL) and history

pub mod types;
pub mod error;
pub mod geometry;
pub mod posture;
pub mod catalog;
pub mod rep_counter;
pub mod controller;
pub mod pipeline;
pub mod config;
pub mod logging;
pub mod wal;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use controller::{
    CaptureControl, FrameOutcome, LifecycleState, NoCapture, WorkoutController, WorkoutEvent,
    WorkoutPlan,
};
pub use rep_counter::{RepEvent, RepPhase};
pub use wal::{JsonlSink, MemorySink, SessionSink};
pub use history::{find_last_session, load_recent_sessions, weekly_stats, WeeklyStats};
