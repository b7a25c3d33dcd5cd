//! Scoring weight configuration
//!
//! Weights are signed: a negative weight turns a feature into a mitigating
//! factor. Inputs are never rejected. Anything that is not a usable number
//! becomes the default weight and every weight is clamped into
//! [`MIN_WEIGHT`, `MAX_WEIGHT`].

use crate::core::{lenient_f64, Feature};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const MIN_WEIGHT: f64 = -2.0;
pub const MAX_WEIGHT: f64 = 2.0;
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Feature or field name -> signed weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, f64>"
)]
pub struct WeightSet {
    weights: BTreeMap<String, f64>,
}

impl WeightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion; the weight is sanitized.
    pub fn with(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.insert(name, weight);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, weight: f64) {
        self.weights.insert(name.into(), sanitize_weight(weight));
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Names that carry an explicit weight, in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.weights.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Weight for an arbitrary field name, defaulting to 1.0.
    pub fn weight_for_field(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Weight for a canonical feature.
    ///
    /// The canonical key wins; otherwise the first alias present is used.
    pub fn weight_for(&self, feature: Feature) -> f64 {
        std::iter::once(feature.key())
            .chain(feature.aliases().iter().copied())
            .find_map(|key| self.weights.get(key).copied())
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Merge another set on top of this one.
    pub fn merged_with(mut self, overrides: &WeightSet) -> Self {
        for (name, weight) in overrides.iter() {
            self.weights.insert(name.to_string(), weight);
        }
        self
    }

    /// Parse a `name=weight` pair as given on the command line.
    pub fn parse_pair(text: &str) -> Result<(String, f64), String> {
        let (name, weight) = text
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=WEIGHT, got '{text}'"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing weight name in '{text}'"));
        }
        Ok((name.to_string(), parse_weight(&Value::String(weight.to_string()))))
    }
}

impl From<BTreeMap<String, Value>> for WeightSet {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let weights = raw
            .into_iter()
            .map(|(name, value)| (name, parse_weight(&value)))
            .collect();
        Self { weights }
    }
}

impl From<WeightSet> for BTreeMap<String, f64> {
    fn from(set: WeightSet) -> Self {
        set.weights
    }
}

impl FromIterator<(String, f64)> for WeightSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut set = WeightSet::new();
        for (name, weight) in iter {
            set.insert(name, weight);
        }
        set
    }
}

/// Interpret a configured weight value.
///
/// Accepts a number, a numeric string or `{"weight": n}`; anything else
/// yields the default weight. The result is clamped to [-2, 2].
pub fn parse_weight(value: &Value) -> f64 {
    let raw = match value {
        Value::Object(map) => map.get("weight").and_then(lenient_f64),
        other => lenient_f64(other),
    };
    sanitize_weight(raw.unwrap_or(DEFAULT_WEIGHT))
}

pub fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    } else {
        DEFAULT_WEIGHT
    }
}
