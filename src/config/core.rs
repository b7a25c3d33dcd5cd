use serde::{Deserialize, Serialize};

use super::lenient::lenient;
use super::pipeline::{CriticalFloor, CutMode};
use super::scoring::WeightSet;
use crate::scoring::age::AgeConfig;

/// Root configuration structure, as read from `.vulntriage.toml`
///
/// Each section and field is read on its own: a value that does not fit
/// is logged and left unset instead of failing the whole file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VulnTriageConfig {
    /// Signed feature weights
    #[serde(default, deserialize_with = "lenient")]
    pub weights: Option<WeightSet>,

    /// Score and threshold settings
    #[serde(default, deserialize_with = "lenient")]
    pub pipeline: Option<PipelineSection>,

    /// Age scoring parameters
    #[serde(default, deserialize_with = "lenient")]
    pub age: Option<AgeConfig>,

    /// Minimum critical flagging
    #[serde(default, deserialize_with = "lenient")]
    pub critical_floor: Option<CriticalFloor>,

    /// Capacity-bounded selection
    #[serde(default, deserialize_with = "lenient")]
    pub triage: Option<TriageSection>,

    /// Top-critical selection
    #[serde(default, deserialize_with = "lenient")]
    pub top: Option<TopSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PipelineSection {
    #[serde(default, deserialize_with = "lenient")]
    pub cut_mode: Option<CutMode>,

    #[serde(default, deserialize_with = "lenient")]
    pub quantiles: Option<[f64; 3]>,

    /// Symmetric cap on robust z-scores
    #[serde(default, deserialize_with = "lenient")]
    pub z_cap: Option<f64>,

    /// Explicit field list (configurable-field mode)
    #[serde(default, deserialize_with = "lenient")]
    pub fields: Option<Vec<String>>,

    /// Map raw scores onto 0-100
    #[serde(default, deserialize_with = "lenient")]
    pub rescale: Option<bool>,

    #[serde(default, deserialize_with = "lenient")]
    pub q_low: Option<f64>,

    #[serde(default, deserialize_with = "lenient")]
    pub q_high: Option<f64>,

    /// Month ages are measured against, e.g. "2025-06"
    #[serde(default, deserialize_with = "lenient")]
    pub reference_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TriageSection {
    #[serde(default, deserialize_with = "lenient")]
    pub capacity: Option<usize>,

    /// Exclude records tagged "ok"
    #[serde(default, deserialize_with = "lenient")]
    pub suppress_ok: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TopSection {
    #[serde(default, deserialize_with = "lenient")]
    pub limit: Option<usize>,

    #[serde(default, deserialize_with = "lenient")]
    pub cut_mode: Option<CutMode>,

    #[serde(default, deserialize_with = "lenient")]
    pub quantiles: Option<[f64; 3]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Feature;
    use crate::scoring::age::DecayMode;

    #[test]
    fn every_section_is_optional() {
        let config: VulnTriageConfig = toml::from_str("").unwrap();
        assert_eq!(config, VulnTriageConfig::default());
    }

    #[test]
    fn parses_full_file() {
        let config: VulnTriageConfig = toml::from_str(
            r#"
            [weights]
            severity = 1.5
            epss = "2"

            [pipeline]
            cut_mode = "quantiles"
            quantiles = [0.4, 0.7, 0.9]
            rescale = true
            reference_date = "2025-06"

            [age]
            horizon_months = 36
            decay = "linear"

            [critical_floor]
            top_frac = 0.2

            [triage]
            capacity = 15
            suppress_ok = false

            [top]
            limit = 10
            "#,
        )
        .unwrap();

        let weights = config.weights.unwrap();
        assert_eq!(weights.weight_for(Feature::Severity), 1.5);
        assert_eq!(weights.weight_for(Feature::ExploitProbability), 2.0);

        let pipeline = config.pipeline.unwrap();
        assert_eq!(pipeline.cut_mode, Some(CutMode::Quantiles));
        assert_eq!(pipeline.quantiles, Some([0.4, 0.7, 0.9]));
        assert_eq!(pipeline.rescale, Some(true));

        let age = config.age.unwrap();
        assert_eq!(age.horizon_months, 36);
        assert_eq!(age.decay, DecayMode::Linear);
        assert_eq!(age.rate, 3.0);

        assert_eq!(config.critical_floor.unwrap().min_count, 5);
        assert_eq!(config.triage.unwrap().capacity, Some(15));
        assert_eq!(config.top.unwrap().limit, Some(10));
    }

    #[test]
    fn invalid_values_fall_back_one_field_at_a_time() {
        let config: VulnTriageConfig = toml::from_str(
            r#"
            [pipeline]
            cut_mode = "median"
            quantiles = [0.5, 0.8]
            z_cap = 2.5

            [age]
            horizon_months = -6
            decay = "cubic"
            rate = 2.0

            [critical_floor]
            min_count = -1

            [triage]
            capacity = -3
            suppress_ok = false

            [top]
            limit = "many"
            quantiles = [0.6, 0.85, 0.97]
            "#,
        )
        .unwrap();

        let pipeline = config.pipeline.unwrap();
        assert_eq!(pipeline.cut_mode, None);
        assert_eq!(pipeline.quantiles, None);
        assert_eq!(pipeline.z_cap, Some(2.5));

        let age = config.age.unwrap();
        assert_eq!(age.horizon_months, 60);
        assert_eq!(age.decay, DecayMode::Exponential);
        assert_eq!(age.rate, 2.0);

        assert_eq!(config.critical_floor.unwrap().min_count, 5);

        let triage = config.triage.unwrap();
        assert_eq!(triage.capacity, None);
        assert_eq!(triage.suppress_ok, Some(false));

        let top = config.top.unwrap();
        assert_eq!(top.limit, None);
        assert_eq!(top.quantiles, Some([0.6, 0.85, 0.97]));
    }

    #[test]
    fn section_of_the_wrong_shape_is_dropped() {
        let config: VulnTriageConfig = toml::from_str(
            r#"
            age = 5

            [weights]
            epss = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.age, None);
        assert_eq!(
            config.weights.unwrap().weight_for(Feature::ExploitProbability),
            2.0
        );
    }
}
