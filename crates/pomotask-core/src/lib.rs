//! # Pomotask Core Library
//!
//! This library provides the core logic for Pomotask, a Pomodoro timer and
//! time-tracking tool. All operations are available through the standalone
//! `pomotask` CLI; any GUI is meant to be a thin layer over this same crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` so completions are detected
//! - **Storage**: append-only session stores (JSON Lines or SQLite), TOML files
//!   for goals, milestones and configuration
//! - **Stats**: pure weekly/monthly aggregation and goal progress
//! - **Milestones**: countdown and anniversary day counts
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionStore`]: Append-only record persistence
//! - [`aggregate`]: Period totals grouped by tag
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod goal;
pub mod milestone;
pub mod record;
pub mod stats;
pub mod storage;
pub mod time;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, PersistenceError, ValidationError};
pub use events::Event;
pub use goal::{Goal, Goals};
pub use milestone::{days_delta, Milestone, MilestoneKind, MilestoneStatus};
pub use record::{EndReason, SessionMode, SessionRecord};
pub use stats::{aggregate, goal_progress, Aggregation, Period, PeriodRange};
pub use storage::{Config, Database, GoalStore, MilestoneStore, SessionLog, SessionStore};
pub use time::{ManualClock, SystemClock, TimeSource};
pub use timer::{PhaseDurations, PhaseRequest, TimerEngine, TimerState};
