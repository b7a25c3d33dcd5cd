//! Capacity-bounded selection of the most urgent records.
//!
//! Two selections sit on top of the pipeline: the triage selector, which
//! fills a fixed capacity while never lowering the bar below the critical
//! boundary, and the top-critical selection, which returns only records
//! classified critical.

use super::pipeline::{score_population, PopulationScores};
use crate::config::PipelineConfig;
use crate::core::{fields, Record, ScoredRecord, SeverityClass, Thresholds};
use crate::observability::{set_phase, Phase};
use crate::scoring::robust::{percentile, round_to};
use serde::Serialize;
use tracing::{debug, info_span};

/// Marker text that suppresses a record from triage.
pub const SUPPRESSION_MARKER: &str = "ok";

/// Outcome of a triage selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageSelection {
    /// Thresholds of the scored pool
    pub thresholds: Thresholds,
    /// Final cut: the larger of the capacity cut and `t3`
    pub threshold_used: f64,
    /// Size of the pool that was scored
    pub population: usize,
    /// Records removed by the suppression filter
    pub suppressed: usize,
    /// Selected records, descending by score
    pub selected: Vec<ScoredRecord>,
}

impl TriageSelection {
    fn empty() -> Self {
        Self {
            thresholds: Thresholds::zero(),
            threshold_used: 0.0,
            population: 0,
            suppressed: 0,
            selected: Vec::new(),
        }
    }
}

/// Outcome of the top-critical selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCritical {
    pub thresholds: Thresholds,
    /// Size of the scored population
    pub population: usize,
    /// Critical records, descending by score, at most `limit` of them
    pub selected: Vec<ScoredRecord>,
}

/// Whether a tag or environment marker contains "ok", case-insensitively.
pub fn has_suppression_marker(record: &Record) -> bool {
    [fields::TAGS, fields::ENVIRONMENTS].iter().any(|key| {
        record
            .markers(key)
            .iter()
            .any(|marker| marker.to_lowercase().contains(SUPPRESSION_MARKER))
    })
}

/// Pick at most `capacity` records, prioritizing the critical class.
///
/// With `suppress_ok`, records carrying an "ok" marker are left out, unless
/// that would leave nothing to select from. The result always holds
/// `min(capacity, pool size)` records.
pub fn triage_select(
    records: &[Record],
    capacity: usize,
    suppress_ok: bool,
    config: &PipelineConfig,
) -> TriageSelection {
    if capacity == 0 || records.is_empty() {
        return TriageSelection::empty();
    }
    let _span = info_span!("triage_select", records = records.len(), capacity).entered();

    let (pool, suppressed) = suppression_pool(records, suppress_ok);
    let scored = score_population(&pool, config);
    let _phase = set_phase(Phase::Selecting);
    let scores: Vec<f64> = scored.records.iter().map(|r| r.ranking_score()).collect();
    let n = scores.len();

    let frac = (1.0 - capacity as f64 / n.max(1) as f64).clamp(0.0, 1.0);
    let capacity_cut = percentile(&scores, frac);
    let cut = capacity_cut.max(scored.thresholds.t3);
    debug!(capacity_cut, t3 = scored.thresholds.t3, cut, suppressed, "Triage cut");

    let PopulationScores {
        thresholds,
        records: ranked,
        ..
    } = scored;
    let selected = fill_to_capacity(ranked, cut, capacity);

    TriageSelection {
        thresholds,
        threshold_used: round_to(cut, 6),
        population: n,
        suppressed,
        selected,
    }
}

fn suppression_pool(records: &[Record], suppress_ok: bool) -> (Vec<Record>, usize) {
    if !suppress_ok {
        return (records.to_vec(), 0);
    }
    let pool: Vec<Record> = records
        .iter()
        .filter(|r| !has_suppression_marker(r))
        .cloned()
        .collect();
    if pool.is_empty() {
        debug!("Every record is suppressed; ignoring suppression");
        return (records.to_vec(), 0);
    }
    let suppressed = records.len() - pool.len();
    (pool, suppressed)
}

/// Records at or above `cut`, then the best of the rest, up to `capacity`.
///
/// `ranked` must be sorted by descending score.
fn fill_to_capacity(ranked: Vec<ScoredRecord>, cut: f64, capacity: usize) -> Vec<ScoredRecord> {
    let (mut selected, leftover): (Vec<_>, Vec<_>) = ranked
        .into_iter()
        .partition(|r| r.ranking_score() >= cut);
    selected.truncate(capacity);
    let need = capacity - selected.len();
    selected.extend(leftover.into_iter().take(need));
    selected
}

/// Critical-class records of a population, best first, at most `limit`.
pub fn top_critical(records: &[Record], limit: usize, config: &PipelineConfig) -> TopCritical {
    let _span = info_span!("top_critical", records = records.len(), limit).entered();
    let scored = score_population(records, config);
    let _phase = set_phase(Phase::Selecting);
    let selected: Vec<ScoredRecord> = scored
        .of_class(SeverityClass::Critical)
        .take(limit)
        .cloned()
        .collect();
    TopCritical {
        thresholds: scored.thresholds,
        population: scored.len(),
        selected,
    }
}
