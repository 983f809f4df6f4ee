//! In-memory session store for tests and embedding.

use crate::error::PersistenceError;
use crate::record::SessionRecord;

use super::SessionStore;

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Vec<SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn append(&mut self, record: &SessionRecord) -> Result<(), PersistenceError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        Ok(self.records.clone())
    }
}
