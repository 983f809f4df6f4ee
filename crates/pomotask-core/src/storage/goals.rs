//! TOML file of per-tag goals.
//!
//! ```toml
//! [[goals]]
//! tag = "Math"
//! target_minutes_per_period = 300
//! period = "week"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, Result, ValidationError};
use crate::goal::{Goal, GoalFields, Goals};

use super::{data_dir, write_atomic, GoalStore};

pub const GOALS_FILE: &str = "goals.toml";

#[derive(Deserialize)]
struct GoalDocument {
    #[serde(default)]
    goals: Vec<GoalFields>,
}

#[derive(Serialize)]
struct GoalDocumentRef<'a> {
    goals: Vec<&'a Goal>,
}

#[derive(Debug, Clone)]
pub struct GoalFile {
    path: PathBuf,
}

impl GoalFile {
    pub fn open() -> Result<Self, PersistenceError> {
        Ok(Self::at(data_dir()?.join(GOALS_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GoalStore for GoalFile {
    fn load(&self) -> Result<Goals> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Goals::new()),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
        };

        let doc: GoalDocument = toml::from_str(&content).map_err(|e| PersistenceError::Decode {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let mut goals = Goals::new();
        for fields in doc.goals {
            let goal = Goal::try_from(fields)?;
            if goals.contains_key(goal.tag()) {
                return Err(ValidationError::invalid(
                    "tag",
                    format!("duplicate goal for '{}'", goal.tag()),
                )
                .into());
            }
            goals.insert(goal.tag().to_string(), goal);
        }
        Ok(goals)
    }

    fn save(&mut self, goals: &Goals) -> Result<(), PersistenceError> {
        let doc = GoalDocumentRef {
            goals: goals.values().collect(),
        };
        let content = toml::to_string_pretty(&doc).map_err(|e| PersistenceError::Encode {
            what: "goals",
            message: e.to_string(),
        })?;
        write_atomic(&self.path, &content)
    }
}
