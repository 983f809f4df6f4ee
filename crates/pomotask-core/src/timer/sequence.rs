use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::SessionMode;

/// Phase lengths used by Pomodoro auto mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Work/short-break pairs before a long break.
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u8,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_long_break_every() -> u8 {
    4
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_every: default_long_break_every(),
        }
    }
}

impl PhaseDurations {
    /// Countdown length for an auto-mode phase. `Custom` never occurs in the
    /// sequence and maps to the work length.
    pub fn seconds_for(&self, mode: SessionMode) -> u64 {
        let minutes = match mode {
            SessionMode::Work | SessionMode::Custom => self.work_minutes,
            SessionMode::ShortBreak => self.short_break_minutes,
            SessionMode::LongBreak => self.long_break_minutes,
        };
        u64::from(minutes).saturating_mul(60)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
            ("long_break_every", u32::from(self.long_break_every)),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ValidationError::invalid(field, "must be greater than zero"));
            }
        }
        Ok(())
    }
}

/// Position within the auto-mode phase sequence:
/// `WORK, SHORT_BREAK` repeated `long_break_every` times, then `LONG_BREAK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSequence {
    phase: SessionMode,
    cycle_index: u8,
}

impl Default for PomodoroSequence {
    fn default() -> Self {
        Self {
            phase: SessionMode::Work,
            cycle_index: 0,
        }
    }
}

impl PomodoroSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The phase that will run next.
    pub fn current(&self) -> SessionMode {
        self.phase
    }

    /// Completed work/short-break pairs in the current round.
    pub fn cycle_index(&self) -> u8 {
        self.cycle_index
    }

    /// Move past the current phase and return the new one.
    pub fn advance(&mut self, long_break_every: u8) -> SessionMode {
        let every = long_break_every.max(1);
        self.phase = match self.phase {
            SessionMode::Work => SessionMode::ShortBreak,
            SessionMode::ShortBreak => {
                self.cycle_index += 1;
                if self.cycle_index >= every {
                    self.cycle_index = 0;
                    SessionMode::LongBreak
                } else {
                    SessionMode::Work
                }
            }
            SessionMode::LongBreak | SessionMode::Custom => {
                self.cycle_index = 0;
                SessionMode::Work
            }
        };
        self.phase
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_durations_are_classic_pomodoro() {
        let d = PhaseDurations::default();
        assert_eq!(d.seconds_for(SessionMode::Work), 25 * 60);
        assert_eq!(d.seconds_for(SessionMode::ShortBreak), 5 * 60);
        assert_eq!(d.seconds_for(SessionMode::LongBreak), 15 * 60);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn zero_duration_fails_validation() {
        let d = PhaseDurations {
            short_break_minutes: 0,
            ..PhaseDurations::default()
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn four_pairs_then_long_break() {
        let mut seq = PomodoroSequence::new();
        let mut phases = vec![seq.current()];
        for _ in 0..9 {
            phases.push(seq.advance(4));
        }
        use SessionMode::*;
        assert_eq!(
            phases,
            vec![
                Work, ShortBreak, Work, ShortBreak, Work, ShortBreak, Work, ShortBreak,
                LongBreak, Work
            ]
        );
        assert_eq!(seq.cycle_index(), 0);
    }

    #[test]
    fn cycle_index_counts_short_breaks() {
        let mut seq = PomodoroSequence::new();
        seq.advance(4); // -> short
        assert_eq!(seq.cycle_index(), 0);
        seq.advance(4); // -> work
        assert_eq!(seq.cycle_index(), 1);
    }
}
