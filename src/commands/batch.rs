//! Full-population recompute and write-back.

use super::report::{emit_report, OutputOptions};
use crate::config::{CutMode, PipelineConfig};
use crate::core::{Result, Thresholds};
use crate::io::{JsonFileStore, PopulationSource, Query, Report, ScoreSink};
use crate::observability::{set_phase, set_store, Phase};
use crate::priority::score_population;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, info_span, warn};

/// Outcome of a batch recompute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub updated: usize,
    pub skipped: usize,
    pub total: usize,
    pub thresholds: Thresholds,
}

/// Rescore every record matching `query` and write the results back.
///
/// Thresholds are always derived by clustering. Records without an identity,
/// or that the sink no longer knows, are counted as skipped.
///
/// # Errors
///
/// Fails only when the store itself cannot be read or written.
pub fn batch_score_and_update<S>(
    store: &mut S,
    config: &PipelineConfig,
    query: &Query,
) -> Result<BatchSummary>
where
    S: PopulationSource + ScoreSink + ?Sized,
{
    let _span = info_span!("batch_score_and_update").entered();
    let total = store.count(query)?;
    let records = store.fetch(query)?;
    if records.is_empty() {
        return Ok(BatchSummary {
            updated: 0,
            skipped: 0,
            total,
            thresholds: Thresholds::zero(),
        });
    }

    let config = config.clone().with_cut_mode(CutMode::Kmeans);
    let scored = score_population(&records, &config);

    let mut by_identity = HashMap::with_capacity(scored.len());
    for record in &scored.records {
        if let Some(identity) = record.identity() {
            by_identity
                .entry(identity)
                .or_insert((record.raw_score, record.class));
        }
    }

    let _phase = set_phase(Phase::WritingBack);
    let mut updated = 0;
    let mut skipped = 0;
    for record in &records {
        let Some(identity) = record.identity() else {
            skipped += 1;
            continue;
        };
        let Some(&(raw_score, class)) = by_identity.get(&identity) else {
            skipped += 1;
            continue;
        };
        if store.write_score(&identity, raw_score, class)? {
            updated += 1;
        } else {
            warn!(identity = %identity, "Scored record vanished from the store");
            skipped += 1;
        }
    }

    info!(updated, skipped, total, "Batch rescore finished");
    Ok(BatchSummary {
        updated,
        skipped,
        total,
        thresholds: scored.thresholds,
    })
}

/// Options of the `batch` command
pub struct BatchConfig {
    pub store: PathBuf,
    pub query: Query,
    pub pipeline: PipelineConfig,
    pub dry_run: bool,
    pub output: OutputOptions,
}

pub fn handle_batch(config: BatchConfig) -> anyhow::Result<()> {
    let _store = set_store(&config.store);
    let mut store = {
        let _phase = set_phase(Phase::Loading);
        JsonFileStore::open(&config.store)?
    };
    let summary = batch_score_and_update(&mut store, &config.pipeline, &config.query)?;
    if config.dry_run {
        info!("Dry run; {} left unchanged", config.store.display());
    } else {
        let _phase = set_phase(Phase::WritingBack);
        store.flush()?;
    }
    emit_report(&Report::Batch(&summary), &config.output)
}
