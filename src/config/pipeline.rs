//! Runtime configuration of the score-and-classify pipeline.
//!
//! Every value a caller can supply is sanitized here rather than rejected:
//! out-of-range numbers are clamped, non-finite ones fall back to defaults,
//! and each adjustment is logged at `warn`.

use super::lenient::lenient;
use super::scoring::WeightSet;
use crate::scoring::age::{AgeConfig, ReferenceMonth};
use crate::scoring::robust::DEFAULT_Z_CAP;
use serde::{Deserialize, Deserializer, Serialize};

/// Default quantile cuts for quantile mode and the cluster-mode fallback.
pub const DEFAULT_QUANTILES: [f64; 3] = [0.50, 0.80, 0.95];

/// Quantile cuts used when selecting the top critical records.
pub const TOP_CRITICAL_QUANTILES: [f64; 3] = [0.60, 0.85, 0.97];

/// How thresholds are derived from the score distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutMode {
    /// 1-D k-means with four centers
    #[default]
    #[serde(alias = "cluster", alias = "clusters")]
    Kmeans,
    /// Empirical percentiles at the configured quantiles
    #[serde(alias = "quantile")]
    Quantiles,
}

/// Winsorized min-max mapping of raw scores onto 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RescaleConfig {
    #[serde(default = "default_q_low")]
    pub q_low: f64,
    #[serde(default = "default_q_high")]
    pub q_high: f64,
}

impl Default for RescaleConfig {
    fn default() -> Self {
        Self {
            q_low: default_q_low(),
            q_high: default_q_high(),
        }
    }
}

fn default_q_low() -> f64 {
    0.01
}

fn default_q_high() -> f64 {
    0.99
}

/// Guarantees a minimum number of records flagged critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalFloor {
    /// Fraction of the population, from the top, flagged critical
    #[serde(default = "default_top_frac", deserialize_with = "top_frac_or_default")]
    pub top_frac: f64,
    /// Minimum number of records flagged critical
    #[serde(default = "default_min_count", deserialize_with = "min_count_or_default")]
    pub min_count: usize,
}

impl Default for CriticalFloor {
    fn default() -> Self {
        Self {
            top_frac: default_top_frac(),
            min_count: default_min_count(),
        }
    }
}

fn default_top_frac() -> f64 {
    0.10
}

fn default_min_count() -> usize {
    5
}

fn top_frac_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or_else(default_top_frac))
}

fn min_count_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or_else(default_min_count))
}

/// Everything one pipeline invocation needs besides the population.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub weights: WeightSet,
    /// Explicit field list; `None` or empty selects the four canonical features
    pub fields: Option<Vec<String>>,
    pub cut_mode: CutMode,
    pub quantiles: [f64; 3],
    pub z_cap: f64,
    /// `Some` selects the legacy 0-100 variant
    pub rescale: Option<RescaleConfig>,
    pub age: AgeConfig,
    pub critical_floor: Option<CriticalFloor>,
    /// Month ages are measured against; `None` means the current month
    pub reference: Option<ReferenceMonth>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: WeightSet::default(),
            fields: None,
            cut_mode: CutMode::default(),
            quantiles: DEFAULT_QUANTILES,
            z_cap: DEFAULT_Z_CAP,
            rescale: None,
            age: AgeConfig::default(),
            critical_floor: None,
            reference: None,
        }
    }
}

impl PipelineConfig {
    /// Legacy 0-100 preset: rescaled scores, quantile cuts and a top-10% /
    /// at-least-5 critical floor.
    pub fn legacy() -> Self {
        Self {
            cut_mode: CutMode::Quantiles,
            rescale: Some(RescaleConfig::default()),
            critical_floor: Some(CriticalFloor::default()),
            ..Self::default()
        }
    }

    pub fn with_weights(mut self, weights: WeightSet) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_cut_mode(mut self, cut_mode: CutMode) -> Self {
        self.cut_mode = cut_mode;
        self
    }

    pub fn with_quantiles(mut self, quantiles: [f64; 3]) -> Self {
        self.quantiles = quantiles;
        self
    }

    pub fn with_reference(mut self, reference: ReferenceMonth) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Score exactly the weighted fields, the way weights arriving as
    /// per-field parameters are interpreted.
    pub fn with_weight_fields(mut self) -> Self {
        self.fields = Some(self.weights.names());
        self
    }

    /// Custom field list if one is active.
    pub fn custom_fields(&self) -> Option<&[String]> {
        self.fields
            .as_deref()
            .filter(|fields| !fields.is_empty())
    }

    pub fn reference_month(&self) -> ReferenceMonth {
        self.reference.unwrap_or_else(ReferenceMonth::current)
    }

    /// Digits thresholds and ranking scores are rounded to.
    pub fn threshold_digits(&self) -> i32 {
        if self.rescale.is_some() {
            2
        } else {
            6
        }
    }

    /// Clamp or default every value into its valid domain.
    pub fn sanitized(mut self) -> Self {
        if !self.z_cap.is_finite() || self.z_cap <= 0.0 {
            log::warn!("Invalid z-score cap {}; using {}", self.z_cap, DEFAULT_Z_CAP);
            self.z_cap = DEFAULT_Z_CAP;
        }

        self.quantiles = sanitize_quantiles(self.quantiles);

        if let Some(fields) = self.fields.take() {
            let mut cleaned: Vec<String> = Vec::with_capacity(fields.len());
            for field in fields {
                let field = field.trim().to_string();
                if !field.is_empty() && !cleaned.contains(&field) {
                    cleaned.push(field);
                }
            }
            self.fields = Some(cleaned);
        }

        if let Some(rescale) = self.rescale.as_mut() {
            let low = sanitize_fraction(rescale.q_low, default_q_low());
            let high = sanitize_fraction(rescale.q_high, default_q_high());
            rescale.q_low = low.min(high);
            rescale.q_high = low.max(high);
        }

        if self.age.horizon_months == 0 {
            log::warn!("Age horizon of 0 months; using 1");
            self.age.horizon_months = 1;
        }
        if !self.age.rate.is_finite() || self.age.rate <= 0.0 {
            log::warn!("Invalid age decay rate {}; using 3.0", self.age.rate);
            self.age.rate = 3.0;
        }

        if let Some(floor) = self.critical_floor.as_mut() {
            floor.top_frac = sanitize_fraction(floor.top_frac, default_top_frac());
        }

        self
    }
}

fn sanitize_fraction(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        log::warn!("Invalid fraction {value}; using {default}");
        default
    }
}

/// Clamp each quantile into [0, 1] and sort ascending so the derived
/// thresholds are ordered.
pub fn sanitize_quantiles(quantiles: [f64; 3]) -> [f64; 3] {
    let mut q = [0.0; 3];
    for (i, value) in quantiles.iter().enumerate() {
        q[i] = sanitize_fraction(*value, DEFAULT_QUANTILES[i]);
    }
    if !(q[0] <= q[1] && q[1] <= q[2]) {
        log::warn!("Quantile cuts {quantiles:?} are not ascending; sorting them");
        q.sort_by(f64::total_cmp);
    }
    q
}
