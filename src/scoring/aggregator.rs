//! Weighted Aggregator.
//!
//! Turns a population of records into one raw score per record: normalize,
//! standardize every feature column robustly, then take the weighted sum.
//! Fixed-field mode scores the four canonical features; configurable mode
//! scores exactly the listed fields.

use crate::config::{PipelineConfig, RescaleConfig};
use crate::core::{Feature, FeatureVector, Record};
use crate::scoring::normalizer::{canonical_features, field_features, normalize_record};
use crate::scoring::robust::{percentile_of_sorted, robust_z_scores, round_to, sorted};
use std::collections::BTreeMap;
use tracing::{debug, info_span};

/// Digits raw scores are rounded to.
pub const RAW_SCORE_DIGITS: i32 = 6;

/// Digits rescaled 0-100 scores are rounded to.
pub const SCALED_SCORE_DIGITS: i32 = 2;

/// Span below which the winsorized range is considered empty.
const RESCALE_EPSILON: f64 = 1e-9;

/// A record with its raw score, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScoredRecord {
    /// The normalized copy of the input record
    pub record: Record,
    pub features: FeatureVector,
    pub raw_score: f64,
    /// 0-100 score, only in the rescaled variant
    pub scaled_score: Option<f64>,
    /// Field list in configurable mode; empty in fixed mode
    pub fields_used: Vec<String>,
    pub weights_used: BTreeMap<String, f64>,
    /// Index of the record in the input population
    pub position: usize,
}

impl RawScoredRecord {
    pub fn ranking_score(&self) -> f64 {
        self.scaled_score.unwrap_or(self.raw_score)
    }
}

/// Column-wise robust z-scores combined into a weighted sum.
struct WeightedColumns {
    names: Vec<String>,
    weights: Vec<f64>,
}

impl WeightedColumns {
    fn fixed(config: &PipelineConfig) -> Self {
        Self {
            names: Feature::ALL.iter().map(|f| f.key().to_string()).collect(),
            weights: Feature::ALL
                .iter()
                .map(|f| config.weights.weight_for(*f))
                .collect(),
        }
    }

    fn custom(fields: &[String], config: &PipelineConfig) -> Self {
        Self {
            names: fields.to_vec(),
            weights: fields
                .iter()
                .map(|name| config.weights.weight_for_field(name))
                .collect(),
        }
    }

    fn scores(&self, features: &[FeatureVector], z_cap: f64) -> Vec<f64> {
        let mut totals = vec![0.0; features.len()];
        for (name, weight) in self.names.iter().zip(&self.weights) {
            let column: Vec<f64> = features
                .iter()
                .map(|f| f.get(name).copied().unwrap_or(0.0))
                .collect();
            for (total, z) in totals.iter_mut().zip(robust_z_scores(&column, z_cap)) {
                *total += z * weight;
            }
        }
        totals
            .into_iter()
            .map(|s| round_to(s, RAW_SCORE_DIGITS))
            .collect()
    }
}

/// Raw scores for a population, sorted descending (ties keep input order).
///
/// Records are normalized here, once; callers pass records as fetched.
pub fn compute_raw_scores(records: &[Record], config: &PipelineConfig) -> Vec<RawScoredRecord> {
    if records.is_empty() {
        return Vec::new();
    }
    let _span = info_span!("compute_raw_scores", records = records.len()).entered();

    let reference = config.reference_month();
    let normalized: Vec<Record> = records
        .iter()
        .map(|r| normalize_record(r, &config.age, reference))
        .collect();

    let (columns, features, custom) = match config.custom_fields() {
        Some(fields) => {
            let features: Vec<FeatureVector> =
                normalized.iter().map(|r| field_features(r, fields)).collect();
            (WeightedColumns::custom(fields, config), features, true)
        }
        None => {
            let features: Vec<FeatureVector> = normalized.iter().map(canonical_features).collect();
            (WeightedColumns::fixed(config), features, false)
        }
    };
    debug!(fields = ?columns.names, weights = ?columns.weights, custom, "Aggregating features");

    let scores = columns.scores(&features, config.z_cap);
    let weights_used: BTreeMap<String, f64> = if custom {
        columns
            .names
            .iter()
            .cloned()
            .zip(columns.weights.iter().copied())
            .collect()
    } else {
        BTreeMap::new()
    };
    let fields_used = if custom {
        columns.names.clone()
    } else {
        Vec::new()
    };

    let mut scored: Vec<RawScoredRecord> = normalized
        .into_iter()
        .zip(features)
        .zip(scores)
        .enumerate()
        .map(|(position, ((record, features), raw_score))| RawScoredRecord {
            record,
            features,
            raw_score,
            scaled_score: None,
            fields_used: fields_used.clone(),
            weights_used: weights_used.clone(),
            position,
        })
        .collect();

    if let Some(rescale) = config.rescale {
        apply_rescale(&mut scored, &rescale);
    }

    sort_descending(&mut scored);
    scored
}

/// Stable sort by raw score, highest first.
pub fn sort_descending(scored: &mut [RawScoredRecord]) {
    scored.sort_by(|a, b| b.raw_score.total_cmp(&a.raw_score));
}

/// Winsorized min-max mapping of every raw score onto 0-100.
///
/// A population whose winsorized span is (near) zero maps to 50.
pub fn apply_rescale(scored: &mut [RawScoredRecord], rescale: &RescaleConfig) {
    let raw: Vec<f64> = scored.iter().map(|r| r.raw_score).collect();
    let xs = sorted(&raw);
    let lo = percentile_of_sorted(&xs, rescale.q_low);
    let hi = percentile_of_sorted(&xs, rescale.q_high);
    let span = hi - lo;
    debug!(lo, hi, "Rescaling raw scores to 0-100");

    for record in scored.iter_mut() {
        let scaled = if span < RESCALE_EPSILON {
            50.0
        } else {
            100.0 * ((record.raw_score - lo) / span).clamp(0.0, 1.0)
        };
        record.scaled_score = Some(round_to(scaled, SCALED_SCORE_DIGITS));
    }
}
