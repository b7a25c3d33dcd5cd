//! End-to-end score-and-classify over one population snapshot.
//!
//! normalize -> standardize -> aggregate -> derive thresholds -> classify.
//! The whole chain is a pure function of the records and the configuration:
//! running it twice on the same input yields identical thresholds and
//! classes.

use super::classifier::classify_population;
use super::thresholds::{derive_thresholds, CutMethod};
use crate::config::PipelineConfig;
use crate::core::{Record, ScoredRecord, SeverityClass, Thresholds};
use crate::observability::{set_phase, Phase};
use crate::scoring::aggregator::compute_raw_scores;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info_span};

/// Result of scoring and classifying a population
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationScores {
    pub thresholds: Thresholds,
    pub method: CutMethod,
    /// Scored records, descending by score; ties keep input order
    pub records: Vec<ScoredRecord>,
}

impl PopulationScores {
    pub fn empty() -> Self {
        Self {
            thresholds: Thresholds::zero(),
            method: CutMethod::Degenerate,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_degenerate(&self) -> bool {
        self.method == CutMethod::Degenerate
    }

    /// Number of records per class, every class present.
    pub fn class_counts(&self) -> BTreeMap<SeverityClass, usize> {
        let mut counts: BTreeMap<SeverityClass, usize> =
            SeverityClass::ALL.iter().map(|c| (*c, 0)).collect();
        for record in &self.records {
            *counts.entry(record.class).or_insert(0) += 1;
        }
        counts
    }

    /// Records of one class, in ranking order.
    pub fn of_class(&self, class: SeverityClass) -> impl Iterator<Item = &ScoredRecord> {
        self.records.iter().filter(move |r| r.class == class)
    }

    /// Scored copy of the record with the given identity.
    pub fn find_by_identity(&self, identity: &str) -> Option<&ScoredRecord> {
        self.records
            .iter()
            .find(|r| r.identity().as_deref() == Some(identity))
    }

    /// Scored copy of a record matched by `(name, date, cve_id)`.
    pub fn find_by_content(&self, record: &Record) -> Option<&ScoredRecord> {
        self.records.iter().find(|r| r.record.same_content(record))
    }
}

/// Score and classify a population.
pub fn score_population(records: &[Record], config: &PipelineConfig) -> PopulationScores {
    if records.is_empty() {
        return PopulationScores::empty();
    }
    let _span = info_span!("score_population", records = records.len()).entered();

    let raw = {
        let _phase = set_phase(Phase::Scoring);
        compute_raw_scores(records, config)
    };
    let _phase = set_phase(Phase::Classifying);
    let scores: Vec<f64> = raw.iter().map(|r| r.ranking_score()).collect();
    let derived = derive_thresholds(
        &scores,
        config.cut_mode,
        config.quantiles,
        config.threshold_digits(),
    );
    debug!(
        t1 = derived.thresholds.t1,
        t2 = derived.thresholds.t2,
        t3 = derived.thresholds.t3,
        method = ?derived.method,
        "Derived thresholds"
    );

    let records = classify_population(raw, &derived, config.critical_floor.as_ref());
    PopulationScores {
        thresholds: derived.thresholds,
        method: derived.method,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CutMode, WeightSet};
    use crate::scoring::age::ReferenceMonth;
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| Record::from_value(v).unwrap())
            .collect()
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default().with_reference(ReferenceMonth::new(2025, 6))
    }

    /// Custom single field with weight 1 so raw scores are the robust
    /// z-scores of `s`.
    fn single_field_config() -> PipelineConfig {
        config()
            .with_weights(WeightSet::new().with("s", 1.0))
            .with_fields(vec!["s".to_string()])
    }

    #[test]
    fn empty_population_short_circuits() {
        let result = score_population(&[], &config());
        assert!(result.is_empty());
        assert_eq!(result.thresholds, Thresholds::zero());
    }

    #[test]
    fn identical_records_are_all_medium() {
        let population = records(vec![
            json!({"_id": 1, "cve": 5, "epss": 0.2}),
            json!({"_id": 2, "cve": 5, "epss": 0.2}),
            json!({"_id": 3, "cve": 5, "epss": 0.2}),
        ]);
        let result = score_population(&population, &config());
        assert!(result.is_degenerate());
        assert_eq!(result.thresholds, Thresholds::collapsed(0.0));
        assert!(result.records.iter().all(|r| r.class == SeverityClass::Medium));
        assert_eq!(result.class_counts()[&SeverityClass::Medium], 3);
    }

    #[test]
    fn isolated_top_scorer_is_critical() {
        // s = 3, 4, 5, 6, 10: median 5, MAD 1 -> z = -1.35, -0.67, 0, 0.67, 3 (capped)
        let population = records(vec![
            json!({"_id": "a", "s": 3}),
            json!({"_id": "b", "s": 4}),
            json!({"_id": "c", "s": 5}),
            json!({"_id": "d", "s": 6}),
            json!({"_id": "e", "s": 10}),
        ]);
        let result = score_population(&population, &single_field_config());
        assert_eq!(result.method, CutMethod::Kmeans);

        let critical: Vec<_> = result.of_class(SeverityClass::Critical).collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].identity().as_deref(), Some("e"));
        assert!(critical[0].is_critical);

        let rest: Vec<_> = result
            .records
            .iter()
            .filter(|r| r.class != SeverityClass::Critical)
            .map(|r| r.class)
            .collect();
        assert_eq!(rest.len(), 4);
        assert!(rest.contains(&SeverityClass::Low));
        assert!(rest.contains(&SeverityClass::Medium));
        assert!(rest.contains(&SeverityClass::High));
    }

    #[test]
    fn rerunning_is_idempotent() {
        let population = records(vec![
            json!({"_id": 1, "cve": 9.8, "epss": 0.97, "companyCriticality": 8, "date": "2019-01"}),
            json!({"_id": 2, "cve": 4.3, "epss": 0.01, "companyCriticality": 2, "date": "2025-05"}),
            json!({"_id": 3, "cvss": 7.5, "epss": 0.4, "date": "2023-11-02"}),
            json!({"_id": 4, "cve": 6.1, "epss": 3.0, "companyCriticality": 5}),
            json!({"_id": 5, "cve": 2.0, "tags": ["ok"]}),
        ]);
        let first = score_population(&population, &config());
        let second = score_population(&population, &config());
        assert_eq!(first, second);
        assert!(first.thresholds.is_ordered());
    }

    #[test]
    fn scored_records_keep_original_fields() {
        let population = records(vec![
            json!({"_id": "x", "name": "openssl", "epss": 0.5}),
            json!({"_id": "y", "name": "zlib", "epss": 0.1}),
        ]);
        let result = score_population(&population, &config());
        let x = result.find_by_identity("x").unwrap();
        assert_eq!(x.record.get("name"), Some(&json!("openssl")));
        assert_eq!(x.features["exploit_probability"], 5.0);
        assert_eq!(x.position, 0);
    }

    #[test]
    fn legacy_preset_classifies_on_scaled_score() {
        let population: Vec<Record> = (0..20)
            .map(|i| Record::new().with_field("_id", i).with_field("cve", f64::from(i) / 2.0))
            .collect();
        let result = score_population(&population, &PipelineConfig::legacy());
        assert!(result.records.iter().all(|r| r.scaled_score.is_some()));
        assert!(result.thresholds.t3 <= 100.0);
        // top 10% of 20 is 2, raised to the minimum of 5
        assert_eq!(result.records.iter().filter(|r| r.is_critical).count(), 5);
    }

    #[test]
    fn quantile_mode_is_selectable() {
        let population: Vec<Record> = (0..10)
            .map(|i| Record::new().with_field("_id", i).with_field("s", i))
            .collect();
        let config = single_field_config().with_cut_mode(CutMode::Quantiles);
        let result = score_population(&population, &config);
        assert_eq!(result.method, CutMethod::Quantiles);
    }
}
