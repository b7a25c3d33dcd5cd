pub mod json_store;
pub mod memory;
pub mod output;
pub mod traits;

// Re-export I/O traits for convenient access
pub use json_store::{parse_population, JsonFileStore, StoreFormat};
pub use memory::MemoryStore;
pub use output::{create_writer, OutputFormat, OutputWriter, Report};
pub use traits::{PopulationSource, Query, ScoreSink};

use crate::core::{Error, Record, Result};
use std::fs;
use std::path::Path;

/// Read a population from a JSON array or JSON Lines file.
pub fn read_population(path: &Path) -> Result<Vec<Record>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::file_system("Failed to read population", path, e))?;
    parse_population(&contents).map_err(|e| e.with_context(format!("Loading {}", path.display())))
}

/// Read a single record from a JSON object file.
pub fn read_record(path: &Path) -> Result<Record> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::file_system("Failed to read record", path, e))?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    Record::from_value(value)
        .ok_or_else(|| Error::invalid_input(format!("{} does not hold a JSON object", path.display())))
}
