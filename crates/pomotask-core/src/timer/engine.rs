//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` periodically.
//! Every command takes the [`TimeSource`] to read, and commands that finish a
//! phase take the [`SessionStore`] the record goes to.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed        (tick, countdown ran out, full record)
//! Running | Paused -> Idle    (stop: partial record if anything elapsed; cancel: none)
//! Completed -> Idle           (acknowledge, advances the auto-mode sequence)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.start(&clock, PhaseRequest::new(SessionMode::Work, 25 * 60))?;
//! // In a loop:
//! engine.tick(&clock, &mut store)?; // Returns Some(Event) when the phase completes
//! ```

use std::fmt;

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::sequence::{PhaseDurations, PomodoroSequence};
use crate::error::{CoreError, PersistenceError, Result, ValidationError};
use crate::events::Event;
use crate::record::{normalize_tag, EndReason, SessionMode, SessionRecord};
use crate::storage::SessionStore;
use crate::time::TimeSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Countdown finished; waiting for `acknowledge()`.
    Completed,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// What to run in normal mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRequest {
    pub mode: SessionMode,
    pub duration_secs: u64,
    pub tag: String,
    pub note: String,
}

impl PhaseRequest {
    pub fn new(mode: SessionMode, duration_secs: u64) -> Self {
        Self {
            mode,
            duration_secs,
            tag: String::new(),
            note: String::new(),
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// The phase currently on the clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivePhase {
    mode: SessionMode,
    duration_secs: u64,
    tag: String,
    note: String,
    started_at: DateTime<Local>,
    /// Active milliseconds banked before the latest resume.
    accumulated_ms: i64,
    /// Set while running.
    resumed_at: Option<DateTime<Local>>,
}

impl ActivePhase {
    fn duration_ms(&self) -> i64 {
        i64::try_from(self.duration_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    fn elapsed_ms(&self, now: DateTime<Local>) -> i64 {
        let live = self
            .resumed_at
            .map(|at| (now - at).num_milliseconds().max(0))
            .unwrap_or(0);
        self.accumulated_ms.saturating_add(live).min(self.duration_ms())
    }

    fn elapsed_secs(&self, now: DateTime<Local>) -> u64 {
        u64::try_from(self.elapsed_ms(now) / 1000).unwrap_or(0)
    }

    fn remaining_secs(&self, now: DateTime<Local>) -> u64 {
        let remaining_ms = self
            .duration_ms()
            .saturating_sub(self.elapsed_ms(now))
            .max(0);
        // Round up so the display reads 00:01 until the very end.
        u64::try_from((remaining_ms + 999) / 1000).unwrap_or(0)
    }

    fn is_finished(&self, now: DateTime<Local>) -> bool {
        self.elapsed_ms(now) >= self.duration_ms()
    }

    /// When the countdown reaches zero, ignoring pauses.
    fn nominal_end(&self) -> DateTime<Local> {
        i64::try_from(self.duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|span| self.started_at.checked_add_signed(span))
            .unwrap_or(self.started_at)
    }

    fn record(&self, end: DateTime<Local>, duration_secs: u64, ended_by: EndReason) -> SessionRecord {
        SessionRecord {
            start_timestamp: self.started_at,
            end_timestamp: end,
            duration_seconds: i64::try_from(duration_secs).unwrap_or(i64::MAX),
            tag: self.tag.clone(),
            note: self.note.clone(),
            mode: self.mode,
            ended_by,
        }
    }
}

/// Core timer engine.
///
/// Owned by the caller; every mutation goes through the methods below.
/// The whole engine is serializable so a shell can persist it between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    #[serde(default)]
    auto_mode: bool,
    /// Auto mode only: acknowledging a phase starts the next one.
    #[serde(default)]
    auto_start: bool,
    #[serde(default)]
    durations: PhaseDurations,
    #[serde(default)]
    sequence: PomodoroSequence,
    #[serde(default)]
    phase: Option<ActivePhase>,
    /// Records whose append failed, oldest first.
    #[serde(default)]
    pending: Vec<SessionRecord>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    /// Create an idle engine in normal mode with default phase durations.
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            auto_mode: false,
            auto_start: false,
            durations: PhaseDurations::default(),
            sequence: PomodoroSequence::new(),
            phase: None,
            pending: Vec::new(),
        }
    }

    /// Create an idle engine in Pomodoro auto mode.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if any duration is zero.
    pub fn auto(durations: PhaseDurations) -> Result<Self> {
        durations.validate()?;
        Ok(Self {
            auto_mode: true,
            durations,
            ..Self::new()
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_auto_mode(&self) -> bool {
        self.auto_mode
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    /// Completed work/short-break pairs in the current auto-mode round.
    pub fn cycle_index(&self) -> u8 {
        self.sequence.cycle_index()
    }

    /// The phase `start_phase` would run next (auto mode only).
    pub fn next_phase(&self) -> Option<SessionMode> {
        self.auto_mode.then(|| self.sequence.current())
    }

    /// Mode of the phase on the clock, if any.
    pub fn current_mode(&self) -> Option<SessionMode> {
        self.phase.as_ref().map(|p| p.mode)
    }

    pub fn current_tag(&self) -> Option<&str> {
        self.phase.as_ref().map(|p| p.tag.as_str())
    }

    pub fn total_secs(&self) -> u64 {
        self.phase.as_ref().map(|p| p.duration_secs).unwrap_or(0)
    }

    pub fn elapsed_secs(&self, clock: &impl TimeSource) -> u64 {
        let now = clock.now();
        self.phase.as_ref().map(|p| p.elapsed_secs(now)).unwrap_or(0)
    }

    pub fn remaining_secs(&self, clock: &impl TimeSource) -> u64 {
        let now = clock.now();
        match (&self.phase, self.state) {
            (_, TimerState::Completed) => 0,
            (Some(p), _) => p.remaining_secs(now),
            (None, _) => 0,
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self, clock: &impl TimeSource) -> f64 {
        let Some(phase) = &self.phase else {
            return 0.0;
        };
        if self.state == TimerState::Completed {
            return 1.0;
        }
        let total_ms = phase.duration_secs as f64 * 1000.0;
        if total_ms == 0.0 {
            return 0.0;
        }
        (phase.elapsed_ms(clock.now()) as f64 / total_ms).clamp(0.0, 1.0)
    }

    /// Records that could not be written and are waiting for `flush_pending`.
    pub fn pending_records(&self) -> &[SessionRecord] {
        &self.pending
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, clock: &impl TimeSource) -> Event {
        Event::StateSnapshot {
            state: self.state,
            auto_mode: self.auto_mode,
            mode: self.current_mode(),
            next_phase: self.next_phase(),
            cycle_index: self.cycle_index(),
            tag: self.current_tag().map(str::to_string),
            elapsed_secs: self.elapsed_secs(clock),
            remaining_secs: self.remaining_secs(clock),
            total_secs: self.total_secs(),
            progress: self.progress(clock),
            pending_records: self.pending.len(),
            at: clock.now(),
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Switch between normal and auto mode. Resets the auto sequence.
    ///
    /// # Errors
    /// Returns `InvalidTransition` unless the timer is idle.
    pub fn set_auto_mode(&mut self, enabled: bool) -> Result<()> {
        self.require(TimerState::Idle, "change mode")?;
        self.auto_mode = enabled;
        self.sequence.reset();
        debug!(auto_mode = enabled, "timer mode changed");
        Ok(())
    }

    pub fn set_auto_start(&mut self, enabled: bool) {
        self.auto_start = enabled;
    }

    /// Replace auto-mode phase lengths. Takes effect from the next phase.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if any duration is zero.
    pub fn set_durations(&mut self, durations: PhaseDurations) -> Result<()> {
        durations.validate()?;
        self.durations = durations;
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a phase with a caller-supplied mode and length (normal mode).
    ///
    /// # Errors
    /// `InvalidConfiguration` for a zero duration or when auto mode is on,
    /// `InvalidTransition` unless idle.
    pub fn start(&mut self, clock: &impl TimeSource, request: PhaseRequest) -> Result<Event> {
        self.require(TimerState::Idle, "start")?;
        if self.auto_mode {
            return Err(ValidationError::invalid(
                "mode",
                "auto mode picks the phase; use start_phase",
            )
            .into());
        }
        self.begin(clock, request)
    }

    /// Start the next phase of the Pomodoro sequence (auto mode).
    ///
    /// # Errors
    /// `InvalidConfiguration` when auto mode is off, `InvalidTransition` unless idle.
    pub fn start_phase(
        &mut self,
        clock: &impl TimeSource,
        tag: impl Into<String>,
        note: impl Into<String>,
    ) -> Result<Event> {
        self.require(TimerState::Idle, "start")?;
        if !self.auto_mode {
            return Err(ValidationError::invalid("mode", "auto mode is off").into());
        }
        let mode = self.sequence.current();
        let request = PhaseRequest::new(mode, self.durations.seconds_for(mode))
            .tag(tag)
            .note(note);
        self.begin(clock, request)
    }

    pub fn pause(&mut self, clock: &impl TimeSource) -> Result<Event> {
        self.require(TimerState::Running, "pause")?;
        let now = clock.now();
        let phase = self.active_mut("pause")?;
        phase.accumulated_ms = phase.elapsed_ms(now);
        phase.resumed_at = None;
        let elapsed_secs = phase.elapsed_secs(now);
        let remaining_secs = phase.remaining_secs(now);
        self.state = TimerState::Paused;
        debug!(elapsed_secs, remaining_secs, "timer paused");
        Ok(Event::TimerPaused {
            elapsed_secs,
            remaining_secs,
            at: now,
        })
    }

    pub fn resume(&mut self, clock: &impl TimeSource) -> Result<Event> {
        self.require(TimerState::Paused, "resume")?;
        let now = clock.now();
        let phase = self.active_mut("resume")?;
        phase.resumed_at = Some(now);
        let remaining_secs = phase.remaining_secs(now);
        self.state = TimerState::Running;
        debug!(remaining_secs, "timer resumed");
        Ok(Event::TimerResumed {
            remaining_secs,
            at: now,
        })
    }

    /// Call periodically. Returns `Some(Event::TimerCompleted)` when the phase finishes.
    ///
    /// # Errors
    /// Returns `Persistence` if the record could not be appended; the record
    /// is kept in [`pending_records`](Self::pending_records) and the engine
    /// is still `Completed`.
    pub fn tick<S>(&mut self, clock: &impl TimeSource, store: &mut S) -> Result<Option<Event>>
    where
        S: SessionStore + ?Sized,
    {
        if self.state != TimerState::Running {
            return Ok(None);
        }
        let now = clock.now();
        let Some(phase) = self.phase.as_ref() else {
            return Ok(None);
        };
        if !phase.is_finished(now) {
            return Ok(None);
        }

        let record = phase.record(phase.nominal_end(), phase.duration_secs, EndReason::Completed);
        if let Some(phase) = self.phase.as_mut() {
            phase.accumulated_ms = phase.duration_ms();
            phase.resumed_at = None;
        }
        self.state = TimerState::Completed;
        debug!(mode = %record.mode, duration_secs = record.duration_seconds, "phase completed");

        self.persist(store, &record)?;
        Ok(Some(Event::TimerCompleted { record, at: now }))
    }

    /// End the phase early. Writes a partial record if any whole second elapsed.
    ///
    /// # Errors
    /// `InvalidTransition` unless running or paused; `Persistence` if the
    /// append failed (the engine is idle and the record is pending).
    pub fn stop<S>(&mut self, clock: &impl TimeSource, store: &mut S) -> Result<Event>
    where
        S: SessionStore + ?Sized,
    {
        self.require_active("stop")?;
        let now = clock.now();
        let phase = self.take_phase("stop")?;
        self.state = TimerState::Idle;

        let elapsed = phase.elapsed_secs(now);
        if elapsed == 0 {
            debug!("stopped with nothing elapsed; no record");
            return Ok(Event::TimerStopped {
                record: None,
                at: now,
            });
        }

        let record = phase.record(now, elapsed, EndReason::Stopped);
        self.persist(store, &record)?;
        Ok(Event::TimerStopped {
            record: Some(record),
            at: now,
        })
    }

    /// Abandon the phase without writing anything.
    pub fn cancel(&mut self, clock: &impl TimeSource) -> Result<Event> {
        self.require_active("cancel")?;
        let now = clock.now();
        let phase = self.take_phase("cancel")?;
        self.state = TimerState::Idle;
        let discarded_secs = phase.elapsed_secs(now);
        debug!(discarded_secs, "phase cancelled");
        Ok(Event::TimerCancelled {
            discarded_secs,
            at: now,
        })
    }

    /// Leave `Completed`. In auto mode this advances the sequence and, with
    /// `auto_start` set, starts the next phase with the same tag and note.
    pub fn acknowledge(&mut self, clock: &impl TimeSource) -> Result<Event> {
        self.require(TimerState::Completed, "acknowledge")?;
        let finished = self.take_phase("acknowledge")?;
        self.state = TimerState::Idle;

        if !self.auto_mode {
            return Ok(Event::PhaseAdvanced {
                next_mode: None,
                cycle_index: self.cycle_index(),
                auto_started: false,
                at: clock.now(),
            });
        }

        let next = self.sequence.advance(self.durations.long_break_every);
        debug!(next = %next, cycle_index = self.cycle_index(), "auto sequence advanced");
        let auto_started = if self.auto_start {
            self.start_phase(clock, finished.tag, finished.note)?;
            true
        } else {
            false
        };
        Ok(Event::PhaseAdvanced {
            next_mode: Some(next),
            cycle_index: self.cycle_index(),
            auto_started,
            at: clock.now(),
        })
    }

    /// Put the auto sequence back at `WORK`, cycle 0.
    pub fn reset_cycle(&mut self, clock: &impl TimeSource) -> Result<Event> {
        if matches!(self.state, TimerState::Running | TimerState::Paused) {
            return Err(CoreError::InvalidTransition {
                operation: "reset the cycle",
                state: self.state,
            });
        }
        self.sequence.reset();
        Ok(Event::CycleReset { at: clock.now() })
    }

    /// Retry appending records whose earlier append failed. Returns how many
    /// were written; stops at the first failure and keeps the rest.
    pub fn flush_pending<S>(&mut self, store: &mut S) -> Result<usize>
    where
        S: SessionStore + ?Sized,
    {
        let mut written = 0;
        while let Some(record) = self.pending.first() {
            store.append(record)?;
            self.pending.remove(0);
            written += 1;
        }
        if written > 0 {
            info!(written, "pending session records flushed");
        }
        Ok(written)
    }

    /// Drop unsaved records explicitly. They are reported as lost.
    pub fn discard_pending(&mut self) -> Vec<SessionRecord> {
        let lost = std::mem::take(&mut self.pending);
        for record in &lost {
            warn!(
                start = %record.start_timestamp,
                duration_secs = record.duration_seconds,
                tag = %record.tag,
                "session record discarded without being saved"
            );
        }
        lost
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self, clock: &impl TimeSource, request: PhaseRequest) -> Result<Event> {
        if request.duration_secs == 0 {
            return Err(
                ValidationError::invalid("duration_seconds", "must be greater than zero").into(),
            );
        }
        let now = clock.now();
        // The whole phase, in milliseconds, must land on a representable instant.
        let fits = i64::try_from(request.duration_secs)
            .ok()
            .filter(|secs| secs.checked_mul(1000).is_some())
            .and_then(Duration::try_seconds)
            .and_then(|span| now.checked_add_signed(span))
            .is_some();
        if !fits {
            return Err(ValidationError::invalid(
                "duration_seconds",
                format!("{} seconds is too long for a timer phase", request.duration_secs),
            )
            .into());
        }
        let tag = normalize_tag(&request.tag);
        self.phase = Some(ActivePhase {
            mode: request.mode,
            duration_secs: request.duration_secs,
            tag: tag.clone(),
            note: request.note.trim().to_string(),
            started_at: now,
            accumulated_ms: 0,
            resumed_at: Some(now),
        });
        self.state = TimerState::Running;
        debug!(mode = %request.mode, duration_secs = request.duration_secs, tag = %tag, "timer started");
        Ok(Event::TimerStarted {
            mode: request.mode,
            duration_secs: request.duration_secs,
            tag,
            cycle_index: self.auto_mode.then(|| self.cycle_index()),
            at: now,
        })
    }

    fn persist<S>(&mut self, store: &mut S, record: &SessionRecord) -> Result<(), PersistenceError>
    where
        S: SessionStore + ?Sized,
    {
        match store.append(record) {
            Ok(()) => {
                info!(
                    mode = %record.mode,
                    duration_secs = record.duration_seconds,
                    tag = %record.tag,
                    "session recorded"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "session append failed; record kept as pending");
                self.pending.push(record.clone());
                Err(e)
            }
        }
    }

    fn require(&self, expected: TimerState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                operation,
                state: self.state,
            })
        }
    }

    fn require_active(&self, operation: &'static str) -> Result<()> {
        match self.state {
            TimerState::Running | TimerState::Paused => Ok(()),
            state => Err(CoreError::InvalidTransition { operation, state }),
        }
    }

    fn active_mut(&mut self, operation: &'static str) -> Result<&mut ActivePhase> {
        let state = self.state;
        self.phase
            .as_mut()
            .ok_or(CoreError::InvalidTransition { operation, state })
    }

    fn take_phase(&mut self, operation: &'static str) -> Result<ActivePhase> {
        let state = self.state;
        self.phase
            .take()
            .ok_or(CoreError::InvalidTransition { operation, state })
    }
}

/// Format seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
