use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::record::{SessionMode, SessionRecord};
use crate::timer::TimerState;

/// Every timer command produces an Event describing what happened.
/// Shells render them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: SessionMode,
        duration_secs: u64,
        tag: String,
        /// Set in auto mode.
        cycle_index: Option<u8>,
        at: DateTime<Local>,
    },
    TimerPaused {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Local>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Local>,
    },
    /// The countdown ran out and the full-length record was written.
    TimerCompleted {
        record: SessionRecord,
        at: DateTime<Local>,
    },
    /// The user ended the phase; `record` is `None` when nothing had elapsed.
    TimerStopped {
        record: Option<SessionRecord>,
        at: DateTime<Local>,
    },
    TimerCancelled {
        discarded_secs: u64,
        at: DateTime<Local>,
    },
    /// A completed phase was acknowledged.
    PhaseAdvanced {
        next_mode: Option<SessionMode>,
        cycle_index: u8,
        auto_started: bool,
        at: DateTime<Local>,
    },
    CycleReset {
        at: DateTime<Local>,
    },
    StateSnapshot {
        state: TimerState,
        auto_mode: bool,
        mode: Option<SessionMode>,
        next_phase: Option<SessionMode>,
        cycle_index: u8,
        tag: Option<String>,
        elapsed_secs: u64,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
        pending_records: usize,
        at: DateTime<Local>,
    },
}
