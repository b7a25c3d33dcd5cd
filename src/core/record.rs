//! Vulnerability records as opaque field maps.
//!
//! A record is whatever the population source hands us: a JSON object with
//! an identity key, descriptive fields and the scoring inputs. Nothing here
//! validates the shape of individual fields; the normalizer decides what a
//! malformed value degrades to.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names shared by the normalizer, the stores and the write-back path.
pub mod fields {
    /// Identity key (string, number or `{"$oid": ...}`)
    pub const ID: &str = "_id";
    /// Exploit probability, either a fraction or already on a 0-10 scale
    pub const EXPLOIT_PROBABILITY: &str = "epss";
    /// Source severity as delivered by the enrichment step
    pub const SEVERITY_SOURCE: &str = "cvss";
    /// Normalized severity
    pub const SEVERITY: &str = "cve";
    /// Business criticality
    pub const CRITICALITY: &str = "companyCriticality";
    /// Textual disclosure/discovery date
    pub const DATE: &str = "date";
    /// Age score derived from `date`
    pub const AGE_SCORE: &str = "date_norm";
    pub const TAGS: &str = "tags";
    pub const ENVIRONMENTS: &str = "environments";
    pub const NAME: &str = "name";
    pub const CVE_ID: &str = "cve_id";
    /// Persisted raw score
    pub const BASE_SCORE: &str = "base_score";
    /// Persisted severity class
    pub const PRIORITY_CLASS: &str = "priority_class";
}

/// Fields used to recognise the same vulnerability when identities differ.
pub const CONTENT_KEY_FIELDS: [&str; 3] = [fields::NAME, fields::DATE, fields::CVE_ID];

/// A caller-owned vulnerability record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Build a record from a JSON value; only objects qualify.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable identity of the record, if it has one.
    ///
    /// Strings and numbers are used verbatim; extended-JSON object ids
    /// (`{"$oid": "..."}`) are unwrapped to their hex string.
    pub fn identity(&self) -> Option<String> {
        identity_of(self.0.get(fields::ID)?)
    }

    /// Whether two records describe the same vulnerability by content.
    ///
    /// Absent fields compare equal to each other, matching how a document
    /// without a `cve_id` still matches its own scored copy.
    pub fn same_content(&self, other: &Record) -> bool {
        CONTENT_KEY_FIELDS
            .iter()
            .all(|key| self.get(key) == other.get(key))
    }

    /// Lenient numeric view of a field.
    ///
    /// Numbers, numeric strings and booleans convert; everything else,
    /// including non-finite values, is `None`.
    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(lenient_f64)
    }

    /// Marker strings carried in a list-valued field (`tags`, `environments`).
    pub fn markers(&self, key: &str) -> Vec<&str> {
        let Some(Value::Array(entries)) = self.get(key) else {
            return Vec::new();
        };
        entries.iter().filter_map(marker_text).collect()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn identity_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(oid)) => Some(oid.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Text of a tag/environment entry: the string itself, or the first
/// non-empty `value`, `status` or `name` member of an object entry.
fn marker_text(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["value", "status", "name"].iter().find_map(|key| {
            map.get(*key)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
        }),
        _ => None,
    }
}

/// Convert a JSON value to a finite float the way a lenient `float()` would.
pub fn lenient_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn identity_accepts_strings_numbers_and_object_ids() {
        assert_eq!(record(json!({"_id": "abc"})).identity().as_deref(), Some("abc"));
        assert_eq!(record(json!({"_id": 42})).identity().as_deref(), Some("42"));
        assert_eq!(
            record(json!({"_id": {"$oid": "65f0c0ffee"}})).identity().as_deref(),
            Some("65f0c0ffee")
        );
        assert_eq!(record(json!({"_id": null})).identity(), None);
        assert_eq!(record(json!({"name": "x"})).identity(), None);
    }

    #[test]
    fn numeric_is_lenient() {
        let r = record(json!({"a": 1.5, "b": " 7 ", "c": "high", "d": true, "e": null}));
        assert_eq!(r.numeric("a"), Some(1.5));
        assert_eq!(r.numeric("b"), Some(7.0));
        assert_eq!(r.numeric("c"), None);
        assert_eq!(r.numeric("d"), Some(1.0));
        assert_eq!(r.numeric("e"), None);
        assert_eq!(r.numeric("missing"), None);
    }

    #[test]
    fn non_finite_strings_are_rejected() {
        let r = record(json!({"a": "NaN", "b": "inf"}));
        assert_eq!(r.numeric("a"), None);
        assert_eq!(r.numeric("b"), None);
    }

    #[test]
    fn markers_read_strings_and_object_members() {
        let r = record(json!({
            "tags": ["prod", {"value": "", "status": "OK"}, {"name": "dmz"}, 3],
            "environments": "not-a-list"
        }));
        assert_eq!(r.markers("tags"), vec!["prod", "OK", "dmz"]);
        assert!(r.markers("environments").is_empty());
    }

    #[test]
    fn same_content_compares_name_date_and_cve_id() {
        let a = record(json!({"_id": 1, "name": "log4shell", "date": "2021-12", "cve_id": "CVE-2021-44228"}));
        let b = record(json!({"_id": 2, "name": "log4shell", "date": "2021-12", "cve_id": "CVE-2021-44228"}));
        let c = record(json!({"_id": 1, "name": "log4shell", "date": "2021-11", "cve_id": "CVE-2021-44228"}));
        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
    }

    #[test]
    fn record_serializes_as_plain_object() {
        let r = Record::new().with_field("_id", "x").with_field("epss", 0.4);
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({"_id": "x", "epss": 0.4}));
    }
}
