//! Severity classification against derived thresholds.

use super::thresholds::DerivedThresholds;
use crate::config::CriticalFloor;
use crate::core::{ScoredRecord, SeverityClass, Thresholds};
use crate::scoring::aggregator::RawScoredRecord;

/// Class of a score. Upper bounds are inclusive: a score equal to a cut
/// belongs to the lower class.
pub fn classify(score: f64, thresholds: &Thresholds) -> SeverityClass {
    if score <= thresholds.t1 {
        SeverityClass::Low
    } else if score <= thresholds.t2 {
        SeverityClass::Medium
    } else if score <= thresholds.t3 {
        SeverityClass::High
    } else {
        SeverityClass::Critical
    }
}

/// Number of top records the floor flags critical in a population of `n`.
pub fn critical_floor_count(n: usize, floor: &CriticalFloor) -> usize {
    let by_fraction = (n as f64 * floor.top_frac).ceil() as usize;
    by_fraction.max(floor.min_count).min(n)
}

/// Classify a population already sorted by descending score.
///
/// Every record of a degenerate population is `medium`. With a critical
/// floor, the leading records are flagged critical on top of those whose
/// class already is; their class label is left alone.
pub fn classify_population(
    scored: Vec<RawScoredRecord>,
    derived: &DerivedThresholds,
    floor: Option<&CriticalFloor>,
) -> Vec<ScoredRecord> {
    let flagged = floor
        .map(|f| critical_floor_count(scored.len(), f))
        .unwrap_or(0);

    scored
        .into_iter()
        .enumerate()
        .map(|(rank, raw)| {
            let class = if derived.is_degenerate() {
                SeverityClass::Medium
            } else {
                classify(raw.ranking_score(), &derived.thresholds)
            };
            ScoredRecord {
                is_critical: class == SeverityClass::Critical || rank < flagged,
                record: raw.record,
                features: raw.features,
                raw_score: raw.raw_score,
                scaled_score: raw.scaled_score,
                class,
                fields_used: raw.fields_used,
                weights_used: raw.weights_used,
                position: raw.position,
            }
        })
        .collect()
}
