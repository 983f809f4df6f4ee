//! TOML file of milestones, saved as a whole.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, Result};
use crate::milestone::Milestone;

use super::{data_dir, write_atomic, MilestoneStore};

pub const MILESTONES_FILE: &str = "milestones.toml";

#[derive(Serialize, Deserialize)]
struct MilestoneDocument {
    #[serde(default)]
    milestones: Vec<Milestone>,
}

#[derive(Debug, Clone)]
pub struct MilestoneFile {
    path: PathBuf,
}

impl MilestoneFile {
    pub fn open() -> Result<Self, PersistenceError> {
        Ok(Self::at(data_dir()?.join(MILESTONES_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MilestoneStore for MilestoneFile {
    fn load(&self) -> Result<Vec<Milestone>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
        };
        let doc: MilestoneDocument =
            toml::from_str(&content).map_err(|e| PersistenceError::Decode {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        for milestone in &doc.milestones {
            milestone.validate()?;
        }
        Ok(doc.milestones)
    }

    fn save(&mut self, milestones: &[Milestone]) -> Result<(), PersistenceError> {
        let doc = MilestoneDocument {
            milestones: milestones.to_vec(),
        };
        let content = toml::to_string_pretty(&doc).map_err(|e| PersistenceError::Encode {
            what: "milestones",
            message: e.to_string(),
        })?;
        write_atomic(&self.path, &content)
    }
}
