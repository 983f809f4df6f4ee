mod engine;
mod sequence;

pub use engine::{format_clock, PhaseRequest, TimerEngine, TimerState};
pub use sequence::{PhaseDurations, PomodoroSequence};
