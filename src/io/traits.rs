//! Collaborator traits for population access and score write-back.
//!
//! The pipeline itself is pure: it never fetches or persists anything. The
//! commands that drive it do so through these traits, so a database driver,
//! a file, or an in-memory fixture can stand behind the same code.
//!
//! # Example
//!
//! ```rust,ignore
//! use vulntriage::io::traits::{PopulationSource, Query};
//!
//! fn critical_count<S: PopulationSource>(source: &S) -> Result<usize> {
//!     let records = source.fetch(&Query::all())?;
//!     // ... pure scoring ...
//! }
//! ```

use crate::core::{Record, Result, SeverityClass};
use serde_json::Value;

/// Conjunction of top-level field equalities; empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: Vec<(String, Value)>,
}

impl Query {
    /// Query matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| record.get(field) == Some(value))
    }

    /// Parse a `field=value` condition.
    ///
    /// The value is read as JSON when it parses (`n=3`, `ok=true`) and as a
    /// plain string otherwise (`name=openssl`).
    pub fn parse_condition(text: &str) -> std::result::Result<(String, Value), String> {
        let (field, value) = text
            .split_once('=')
            .ok_or_else(|| format!("expected FIELD=VALUE, got '{text}'"))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(format!("missing field name in '{text}'"));
        }
        let value = serde_json::from_str(value.trim())
            .unwrap_or_else(|_| Value::String(value.trim().to_string()));
        Ok((field.to_string(), value))
    }
}

impl FromIterator<(String, Value)> for Query {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

/// Supplier of vulnerability populations.
pub trait PopulationSource {
    /// Every record matching the query, in storage order.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying store cannot be read.
    fn fetch(&self, query: &Query) -> Result<Vec<Record>>;

    /// Number of records matching the query.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying store cannot be read.
    fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.fetch(query)?.len())
    }

    /// Up to `limit` records, in storage order.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying store cannot be read.
    fn sample(&self, limit: usize) -> Result<Vec<Record>>;
}

/// Receiver of computed scores.
pub trait ScoreSink {
    /// Persist the raw score and class of the record with `identity`.
    ///
    /// Returns `Ok(false)` when no such record exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the write itself fails.
    fn write_score(&mut self, identity: &str, raw_score: f64, class: SeverityClass)
        -> Result<bool>;
}
