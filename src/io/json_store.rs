//! File-backed population store.
//!
//! A store file holds either one JSON array of record objects or one record
//! object per line (JSON Lines). Scores written through [`ScoreSink`] are
//! applied in memory and reach the file on [`JsonFileStore::flush`].

use super::memory::MemoryStore;
use super::traits::{PopulationSource, Query, ScoreSink};
use crate::core::{Error, Record, Result, SeverityClass};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout of a store file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    /// A single JSON array
    Array,
    /// One JSON object per line
    Lines,
}

impl StoreFormat {
    /// Layout implied by the file extension, if any.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "jsonl" | "ndjson" => Some(StoreFormat::Lines),
            "json" => Some(StoreFormat::Array),
            _ => None,
        }
    }

    /// Layout of existing content: an array if it starts with `[`.
    pub fn sniff(contents: &str) -> Self {
        if contents.trim_start().starts_with('[') {
            StoreFormat::Array
        } else {
            StoreFormat::Lines
        }
    }
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    format: StoreFormat,
    inner: MemoryStore,
    dirty: bool,
}

impl JsonFileStore {
    /// Open and read a store file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path)
            .map_err(|e| Error::file_system("Failed to read store", &path, e))?;
        let format = StoreFormat::sniff(&contents);
        let records = parse_records(&contents, format)
            .map_err(|e| e.with_context(format!("Loading {}", path.display())))?;
        log::debug!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self {
            path,
            format,
            inner: MemoryStore::new(records),
            dirty: false,
        })
    }

    /// A new store over the given records; nothing is written until flushed.
    pub fn create(path: impl Into<PathBuf>, records: Vec<Record>) -> Self {
        let path = path.into();
        let format = StoreFormat::from_extension(&path).unwrap_or(StoreFormat::Array);
        Self {
            path,
            format,
            inner: MemoryStore::new(records),
            dirty: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    pub fn records(&self) -> &[Record] {
        self.inner.records()
    }

    /// Whether there are writes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the store back in its original layout.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let contents = render_records(self.inner.records(), self.format)?;
        fs::write(&self.path, contents)
            .map_err(|e| Error::file_system("Failed to write store", &self.path, e))?;
        self.dirty = false;
        log::debug!("Flushed {} records to {}", self.inner.len(), self.path.display());
        Ok(())
    }
}

impl PopulationSource for JsonFileStore {
    fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        self.inner.fetch(query)
    }

    fn count(&self, query: &Query) -> Result<usize> {
        self.inner.count(query)
    }

    fn sample(&self, limit: usize) -> Result<Vec<Record>> {
        self.inner.sample(limit)
    }
}

impl ScoreSink for JsonFileStore {
    fn write_score(
        &mut self,
        identity: &str,
        raw_score: f64,
        class: SeverityClass,
    ) -> Result<bool> {
        let updated = self.inner.write_score(identity, raw_score, class)?;
        self.dirty |= updated;
        Ok(updated)
    }
}

/// Parse records in the given layout. Blank lines are skipped in JSON Lines.
pub fn parse_records(contents: &str, format: StoreFormat) -> Result<Vec<Record>> {
    match format {
        StoreFormat::Array => match serde_json::from_str::<Value>(contents)? {
            Value::Array(values) => values
                .into_iter()
                .enumerate()
                .map(|(i, v)| into_record(v, i + 1))
                .collect(),
            _ => Err(Error::invalid_input("expected a JSON array of records")),
        },
        StoreFormat::Lines => contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| into_record(serde_json::from_str(line)?, i + 1))
            .collect(),
    }
}

/// Read records from JSON text in either layout.
pub fn parse_population(contents: &str) -> Result<Vec<Record>> {
    parse_records(contents, StoreFormat::sniff(contents))
}

fn into_record(value: Value, position: usize) -> Result<Record> {
    Record::from_value(value)
        .ok_or_else(|| Error::invalid_input(format!("entry {position} is not a JSON object")))
}

fn render_records(records: &[Record], format: StoreFormat) -> Result<String> {
    match format {
        StoreFormat::Array => {
            let mut text = serde_json::to_string_pretty(records)?;
            text.push('\n');
            Ok(text)
        }
        StoreFormat::Lines => {
            let mut text = String::new();
            for record in records {
                text.push_str(&serde_json::to_string(record)?);
                text.push('\n');
            }
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn layout_detection() {
        assert_eq!(StoreFormat::sniff("  [ {} ]"), StoreFormat::Array);
        assert_eq!(StoreFormat::sniff("{}\n{}"), StoreFormat::Lines);
        assert_eq!(
            StoreFormat::from_extension(Path::new("vulns.ndjson")),
            Some(StoreFormat::Lines)
        );
        assert_eq!(StoreFormat::from_extension(Path::new("vulns")), None);
    }

    #[test]
    fn parses_both_layouts() {
        let array = parse_population(r#"[{"_id": 1}, {"_id": 2}]"#).unwrap();
        let lines = parse_population("{\"_id\": 1}\n\n{\"_id\": 2}\n").unwrap();
        assert_eq!(array, lines);
    }

    #[test]
    fn non_object_entries_are_rejected() {
        let err = parse_population("[{\"_id\": 1}, 7]").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: entry 2 is not a JSON object");
        assert!(parse_population("{\"a\": 1}\n[1]").is_err());
        assert!(matches!(
            parse_records("{\"a\": 1}", StoreFormat::Array),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn writes_reach_disk_on_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.jsonl");
        fs::write(&path, "{\"_id\": \"a\"}\n{\"_id\": \"b\"}\n").unwrap();

        let mut store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.format(), StoreFormat::Lines);
        assert!(store.write_score("a", 2.5, SeverityClass::Critical).unwrap());
        assert!(store.is_dirty());
        store.flush().unwrap();
        assert!(!store.is_dirty());

        let reopened = JsonFileStore::open(&path).unwrap();
        let a = &reopened.records()[0];
        assert_eq!(a.get("base_score"), Some(&json!(2.5)));
        assert_eq!(a.get("priority_class"), Some(&json!("critical")));
    }

    #[test]
    fn created_store_writes_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.json");
        let mut store = JsonFileStore::create(&path, vec![Record::new().with_field("_id", 1)]);
        store.flush().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('['));
    }

    #[test]
    fn missing_file_is_a_file_system_error() {
        let dir = TempDir::new().unwrap();
        let err = JsonFileStore::open(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
    }
}
