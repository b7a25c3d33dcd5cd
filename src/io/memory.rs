//! Population store held in memory, for tests and embedding callers.

use super::traits::{PopulationSource, Query, ScoreSink};
use crate::core::{fields, Record, Result, SeverityClass};

/// In-memory population store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    records: Vec<Record>,
}

impl MemoryStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.identity().as_deref() == Some(identity))
    }
}

impl PopulationSource for MemoryStore {
    fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }

    fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.records.iter().filter(|r| query.matches(r)).count())
    }

    fn sample(&self, limit: usize) -> Result<Vec<Record>> {
        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

impl ScoreSink for MemoryStore {
    fn write_score(
        &mut self,
        identity: &str,
        raw_score: f64,
        class: SeverityClass,
    ) -> Result<bool> {
        let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r.identity().as_deref() == Some(identity))
        else {
            return Ok(false);
        };
        record.set(fields::BASE_SCORE, raw_score);
        record.set(fields::PRIORITY_CLASS, class.label());
        Ok(true)
    }
}
