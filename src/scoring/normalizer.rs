//! Feature Normalizer.
//!
//! Maps heterogeneous raw fields onto a common 0-10 scale. Pure and total:
//! anything unparseable degrades to 0 instead of failing the batch.

use crate::core::{fields, lenient_f64, Feature, FeatureVector, Record};
use crate::scoring::age::{age_score_value, AgeConfig, ReferenceMonth};
use serde_json::Value;

pub const FEATURE_MIN: f64 = 0.0;
pub const FEATURE_MAX: f64 = 10.0;

/// Clamp a numeric value into [0, 10]; non-numeric input becomes 0.
pub fn clamp_0_10(value: Option<&Value>) -> f64 {
    value
        .and_then(lenient_f64)
        .map(clamp_feature)
        .unwrap_or(FEATURE_MIN)
}

/// Clamp an already-numeric feature into [0, 10].
pub fn clamp_feature(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(FEATURE_MIN, FEATURE_MAX)
    } else {
        FEATURE_MIN
    }
}

/// Exploit probability on a 0-10 scale.
///
/// Fractions in [0, 1] are multiplied by 10; values in (1, 10] are taken to
/// be on the 0-10 scale already and pass through unchanged. A value such as
/// `1.5` is therefore read as 1.5/10, not 15%.
pub fn exploit_probability_0_10(value: Option<&Value>) -> f64 {
    let v = value.and_then(lenient_f64).unwrap_or(0.0).max(0.0);
    if v > 1.0 {
        v.min(FEATURE_MAX)
    } else {
        v * 10.0
    }
}

/// Normalized copy of a record.
///
/// - `epss` is rescaled when present and left absent otherwise.
/// - `cve` holds the severity: from `cvss` when `cve` is absent, otherwise
///   from `cve`.
/// - `companyCriticality` is clamped, defaulting to 0.
/// - `date_norm` receives the age score of `date`.
///
/// Every other field is carried over untouched.
pub fn normalize_record(record: &Record, age: &AgeConfig, reference: ReferenceMonth) -> Record {
    let mut out = record.clone();

    if record.contains(fields::EXPLOIT_PROBABILITY) {
        out.set(
            fields::EXPLOIT_PROBABILITY,
            exploit_probability_0_10(record.get(fields::EXPLOIT_PROBABILITY)),
        );
    }

    let severity = if record.contains(fields::SEVERITY_SOURCE) && !record.contains(fields::SEVERITY)
    {
        clamp_0_10(record.get(fields::SEVERITY_SOURCE))
    } else {
        clamp_0_10(record.get(fields::SEVERITY))
    };
    out.set(fields::SEVERITY, severity);

    out.set(
        fields::CRITICALITY,
        clamp_0_10(record.get(fields::CRITICALITY)),
    );
    out.set(
        fields::AGE_SCORE,
        age_score_value(record.get(fields::DATE), reference, age),
    );

    out
}

/// Canonical feature vector of a normalized record.
///
/// Reads the fields written by [`normalize_record`] and only re-clamps, so
/// an exploit probability is never scaled twice.
pub fn canonical_features(normalized: &Record) -> FeatureVector {
    Feature::ALL
        .iter()
        .map(|feature| {
            (
                feature.key().to_string(),
                clamp_0_10(normalized.get(feature.normalized_field())),
            )
        })
        .collect()
}

/// Feature vector over an explicit field list, each value re-clamped.
pub fn field_features(record: &Record, field_names: &[String]) -> FeatureVector {
    field_names
        .iter()
        .map(|name| (name.clone(), clamp_0_10(record.get(name))))
        .collect()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn normalized_values_stay_in_range(v in -1e6f64..1e6) {
            let epss = exploit_probability_0_10(Some(&json!(v)));
            let clamped = clamp_0_10(Some(&json!(v)));
            prop_assert!((FEATURE_MIN..=FEATURE_MAX).contains(&epss));
            prop_assert!((FEATURE_MIN..=FEATURE_MAX).contains(&clamped));
        }
    }
}
