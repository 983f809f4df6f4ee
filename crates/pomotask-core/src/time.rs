//! Wall-clock sources for the timer engine.
//!
//! The engine never reads the system clock itself; every command takes a
//! [`TimeSource`] so that tests and embedders control time explicitly.

use std::cell::Cell;

use chrono::{DateTime, Duration, Local};

/// Supplies the current wall-clock time.
pub trait TimeSource {
    fn now(&self) -> DateTime<Local>;
}

/// The real local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, at: DateTime<Local>) {
        self.now.set(at);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }
}
