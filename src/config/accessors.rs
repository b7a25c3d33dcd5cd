//! Resolve the file configuration into runtime settings, with defaults
//! filled in for every section that was left out.

use super::core::VulnTriageConfig;
use super::pipeline::{CutMode, PipelineConfig, RescaleConfig, TOP_CRITICAL_QUANTILES};
use crate::scoring::age::ReferenceMonth;

/// Default capacity of a triage selection
pub const DEFAULT_TRIAGE_CAPACITY: usize = 20;

/// Default number of records returned by the top-critical selection
pub const DEFAULT_TOP_LIMIT: usize = 30;

/// Resolved triage settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriageSettings {
    pub capacity: usize,
    pub suppress_ok: bool,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_TRIAGE_CAPACITY,
            suppress_ok: true,
        }
    }
}

impl VulnTriageConfig {
    /// Pipeline configuration described by the file, sanitized
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        if let Some(weights) = &self.weights {
            config.weights = weights.clone();
        }
        if let Some(age) = &self.age {
            config.age = age.clone();
        }
        config.critical_floor = self.critical_floor;

        if let Some(section) = &self.pipeline {
            if let Some(cut_mode) = section.cut_mode {
                config.cut_mode = cut_mode;
            }
            if let Some(quantiles) = section.quantiles {
                config.quantiles = quantiles;
            }
            if let Some(z_cap) = section.z_cap {
                config.z_cap = z_cap;
            }
            config.fields = section.fields.clone();
            if section.rescale == Some(true) {
                let defaults = RescaleConfig::default();
                config.rescale = Some(RescaleConfig {
                    q_low: section.q_low.unwrap_or(defaults.q_low),
                    q_high: section.q_high.unwrap_or(defaults.q_high),
                });
            }
            config.reference = section.reference_date.as_deref().and_then(parse_reference);
        }

        config.sanitized()
    }

    /// Pipeline configuration for the top-critical selection.
    ///
    /// Defaults to quantile cuts at (0.60, 0.85, 0.97) unless `[top]`
    /// overrides them.
    pub fn top_pipeline_config(&self) -> PipelineConfig {
        let top = self.top.clone().unwrap_or_default();
        let mut config = self.pipeline_config();
        config.cut_mode = top.cut_mode.unwrap_or(CutMode::Quantiles);
        config.quantiles = top.quantiles.unwrap_or(TOP_CRITICAL_QUANTILES);
        config.sanitized()
    }

    pub fn top_limit(&self) -> usize {
        self.top
            .as_ref()
            .and_then(|t| t.limit)
            .unwrap_or(DEFAULT_TOP_LIMIT)
    }

    pub fn triage_settings(&self) -> TriageSettings {
        let defaults = TriageSettings::default();
        let section = self.triage.clone().unwrap_or_default();
        TriageSettings {
            capacity: section.capacity.unwrap_or(defaults.capacity),
            suppress_ok: section.suppress_ok.unwrap_or(defaults.suppress_ok),
        }
    }
}

fn parse_reference(text: &str) -> Option<ReferenceMonth> {
    let parsed = ReferenceMonth::parse(text);
    if parsed.is_none() {
        log::warn!("Unrecognized reference date '{}'; using the current month", text);
    }
    parsed
}
