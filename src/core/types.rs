//! Common type definitions used across the codebase

use super::record::{fields, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Ordinal urgency class, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityClass {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityClass {
    pub const ALL: [SeverityClass; 4] = [
        SeverityClass::Low,
        SeverityClass::Medium,
        SeverityClass::High,
        SeverityClass::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SeverityClass::Low => "low",
            SeverityClass::Medium => "medium",
            SeverityClass::High => "high",
            SeverityClass::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SeverityClass {
    type Err = String;

    /// Accepts the English labels and the legacy labels still found in
    /// previously persisted `priority_class` values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "baixa" => Ok(SeverityClass::Low),
            "medium" | "media" | "média" => Ok(SeverityClass::Medium),
            "high" | "alta" => Ok(SeverityClass::High),
            "critical" | "gravissima" | "gravíssima" => Ok(SeverityClass::Critical),
            other => Err(format!("unknown severity class '{other}'")),
        }
    }
}

/// Three cut points partitioning the score axis into four classes.
///
/// Intervals are closed on the upper end: a score equal to `t1` is `low`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Thresholds {
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
}

impl Thresholds {
    pub fn new(t1: f64, t2: f64, t3: f64) -> Self {
        Self { t1, t2, t3 }
    }

    /// Thresholds reported for an empty population.
    pub fn zero() -> Self {
        Self::default()
    }

    /// All three cuts at one value (degenerate population).
    pub fn collapsed(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn is_ordered(&self) -> bool {
        self.t1 <= self.t2 && self.t2 <= self.t3
    }

    pub fn rounded(&self, digits: i32) -> Self {
        Self::new(
            crate::scoring::robust::round_to(self.t1, digits),
            crate::scoring::robust::round_to(self.t2, digits),
            crate::scoring::robust::round_to(self.t3, digits),
        )
    }
}

/// The four canonical scoring features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Severity,
    ExploitProbability,
    Criticality,
    Age,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Severity,
        Feature::ExploitProbability,
        Feature::Criticality,
        Feature::Age,
    ];

    /// Canonical name used in weight sets and in `_features`.
    pub fn key(&self) -> &'static str {
        match self {
            Feature::Severity => "severity",
            Feature::ExploitProbability => "exploit_probability",
            Feature::Criticality => "criticality",
            Feature::Age => "age",
        }
    }

    /// Alternative weight keys, named after the record fields.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Feature::Severity => &[fields::SEVERITY, fields::SEVERITY_SOURCE],
            Feature::ExploitProbability => &[fields::EXPLOIT_PROBABILITY],
            Feature::Criticality => &[fields::CRITICALITY],
            Feature::Age => &[fields::DATE, fields::AGE_SCORE],
        }
    }

    /// Field of a normalized record that holds this feature.
    pub fn normalized_field(&self) -> &'static str {
        match self {
            Feature::Severity => fields::SEVERITY,
            Feature::ExploitProbability => fields::EXPLOIT_PROBABILITY,
            Feature::Criticality => fields::CRITICALITY,
            Feature::Age => fields::AGE_SCORE,
        }
    }

    pub fn from_key(key: &str) -> Option<Feature> {
        Feature::ALL
            .into_iter()
            .find(|f| f.key() == key || f.aliases().contains(&key))
    }
}

/// Per-record feature values, each in [0, 10].
pub type FeatureVector = BTreeMap<String, f64>;

/// A record after the full score-and-classify pipeline.
///
/// The original fields are flattened back out on serialization, followed by
/// the derived `_`-prefixed fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: Record,
    #[serde(rename = "_features", skip_serializing_if = "BTreeMap::is_empty")]
    pub features: FeatureVector,
    #[serde(rename = "_raw_score")]
    pub raw_score: f64,
    #[serde(rename = "_score_0_100", skip_serializing_if = "Option::is_none")]
    pub scaled_score: Option<f64>,
    #[serde(rename = "_class")]
    pub class: SeverityClass,
    #[serde(rename = "_is_critical")]
    pub is_critical: bool,
    #[serde(rename = "_fields_used", skip_serializing_if = "Vec::is_empty")]
    pub fields_used: Vec<String>,
    #[serde(rename = "_weights_used", skip_serializing_if = "BTreeMap::is_empty")]
    pub weights_used: BTreeMap<String, f64>,
    /// Position of the record in the population as supplied.
    #[serde(skip)]
    pub position: usize,
}

impl ScoredRecord {
    /// Score that thresholds and ranking operate on: the rescaled score in
    /// the legacy variant, the raw score otherwise.
    pub fn ranking_score(&self) -> f64 {
        self.scaled_score.unwrap_or(self.raw_score)
    }

    pub fn identity(&self) -> Option<String> {
        self.record.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_classes_are_ordered_by_urgency() {
        assert!(SeverityClass::Low < SeverityClass::Medium);
        assert!(SeverityClass::Medium < SeverityClass::High);
        assert!(SeverityClass::High < SeverityClass::Critical);
    }

    #[test]
    fn severity_class_parses_legacy_labels() {
        assert_eq!("gravissima".parse::<SeverityClass>(), Ok(SeverityClass::Critical));
        assert_eq!("Media".parse::<SeverityClass>(), Ok(SeverityClass::Medium));
        assert_eq!("high".parse::<SeverityClass>(), Ok(SeverityClass::High));
        assert!("urgent".parse::<SeverityClass>().is_err());
    }

    #[test]
    fn severity_class_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SeverityClass::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn feature_lookup_by_alias() {
        assert_eq!(Feature::from_key("epss"), Some(Feature::ExploitProbability));
        assert_eq!(Feature::from_key("cvss"), Some(Feature::Severity));
        assert_eq!(Feature::from_key("date_norm"), Some(Feature::Age));
        assert_eq!(Feature::from_key("criticality"), Some(Feature::Criticality));
        assert_eq!(Feature::from_key("unknown"), None);
    }

    #[test]
    fn thresholds_round_each_cut() {
        let t = Thresholds::new(0.1234567, 1.0, 2.9999999).rounded(6);
        assert_eq!(t, Thresholds::new(0.123457, 1.0, 3.0));
        assert!(t.is_ordered());
    }

    #[test]
    fn scored_record_flattens_original_fields() {
        let scored = ScoredRecord {
            record: Record::new().with_field("_id", "a").with_field("epss", 9.0),
            features: FeatureVector::new(),
            raw_score: 1.5,
            scaled_score: None,
            class: SeverityClass::High,
            is_critical: false,
            fields_used: Vec::new(),
            weights_used: BTreeMap::new(),
            position: 0,
        };
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["_id"], "a");
        assert_eq!(value["_raw_score"], 1.5);
        assert_eq!(value["_class"], "high");
        assert!(value.get("_features").is_none());
        assert!(value.get("_score_0_100").is_none());
    }
}
