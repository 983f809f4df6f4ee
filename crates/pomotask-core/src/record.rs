//! Session records: the durable output of the timer.
//!
//! A record is created exactly once per completed or manually ended phase and
//! is never changed afterwards. Stores only ever append them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length of a tag after normalization.
pub const MAX_TAG_CHARS: usize = 30;

const NOTE_PREVIEW_CHARS: usize = 140;

/// What kind of interval a phase was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Work,
    ShortBreak,
    LongBreak,
    Custom,
}

impl SessionMode {
    pub const ALL: [SessionMode; 4] = [
        SessionMode::Work,
        SessionMode::ShortBreak,
        SessionMode::LongBreak,
        SessionMode::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Work => "work",
            SessionMode::ShortBreak => "short_break",
            SessionMode::LongBreak => "long_break",
            SessionMode::Custom => "custom",
        }
    }

    /// Human-facing title, e.g. for a window or status line.
    pub fn title(&self) -> &'static str {
        match self {
            SessionMode::Work => "Work",
            SessionMode::ShortBreak => "Short Break",
            SessionMode::LongBreak => "Long Break",
            SessionMode::Custom => "Custom",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "work" => Ok(SessionMode::Work),
            "short_break" | "short" => Ok(SessionMode::ShortBreak),
            "long_break" | "long" => Ok(SessionMode::LongBreak),
            "custom" => Ok(SessionMode::Custom),
            other => Err(ValidationError::invalid(
                "mode",
                format!("unknown mode '{other}'"),
            )),
        }
    }
}

/// How a phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The countdown ran out.
    #[default]
    Completed,
    /// The user ended the phase early.
    Stopped,
}

/// One finished timer phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start_timestamp: DateTime<Local>,
    pub end_timestamp: DateTime<Local>,
    /// Active (unpaused) seconds. Signed so hand-edited logs with bad values
    /// still load and get flagged by aggregation.
    pub duration_seconds: i64,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub note: String,
    pub mode: SessionMode,
    #[serde(default)]
    pub ended_by: EndReason,
}

impl SessionRecord {
    /// Calendar date the record is attributed to (its start, never its end).
    pub fn local_date(&self) -> NaiveDate {
        self.start_timestamp.date_naive()
    }

    /// Wall-clock seconds between start and end, including paused time.
    pub fn span_seconds(&self) -> i64 {
        (self.end_timestamp - self.start_timestamp).num_seconds()
    }

    /// Single-line note for list views.
    pub fn note_preview(&self) -> String {
        let collapsed = self.note.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() > NOTE_PREVIEW_CHARS {
            let mut cut: String = collapsed.chars().take(NOTE_PREVIEW_CHARS - 1).collect();
            cut.push('…');
            cut
        } else {
            collapsed
        }
    }
}

/// Trim a tag and cap its length. Empty tags stay empty.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().chars().take(MAX_TAG_CHARS).collect::<String>().trim_end().to_string()
}
