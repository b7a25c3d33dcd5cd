//! Score one document against a sampled population and write it back.

use super::report::{emit_report, OutputOptions};
use crate::config::{CutMode, PipelineConfig};
use crate::core::{Error, Record, Result, SeverityClass, Thresholds};
use crate::io::{read_record, JsonFileStore, PopulationSource, Report, ScoreSink};
use crate::observability::{set_phase, set_store, Phase};
use crate::priority::score_population;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info_span};

/// Population sample drawn around a single document
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Outcome of scoring one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleScore {
    pub identity: String,
    pub raw_score: f64,
    pub class: SeverityClass,
    pub thresholds: Thresholds,
    /// Whether the store held the document and took the new score
    pub persisted: bool,
}

/// Score `doc` in the context of up to `sample_size` stored records.
///
/// The document joins the sample unless a record with its identity is
/// already there. Its scored copy is located by identity, then by
/// `(name, date, cve_id)`, and as a last resort the top-ranked record
/// stands in. Thresholds are always derived by clustering.
///
/// # Errors
///
/// Returns [`Error::MissingIdentity`] if `doc` has no `_id`, or a store
/// error if the sample cannot be read or the score cannot be written.
pub fn score_and_update<S>(
    doc: &Record,
    store: &mut S,
    config: &PipelineConfig,
    sample_size: usize,
) -> Result<SingleScore>
where
    S: PopulationSource + ScoreSink + ?Sized,
{
    let identity = doc.identity().ok_or(Error::MissingIdentity)?;
    let _span = info_span!("score_and_update", identity = %identity).entered();

    let mut sample = store.sample(sample_size)?;
    let present = sample
        .iter()
        .any(|r| r.identity().as_deref() == Some(identity.as_str()));
    if !present {
        sample.push(doc.clone());
    }
    debug!(sample = sample.len(), present, "Scoring against sample");

    let config = config.clone().with_cut_mode(CutMode::Kmeans);
    let scored = score_population(&sample, &config);
    let target = scored
        .find_by_identity(&identity)
        .or_else(|| scored.find_by_content(doc))
        .or_else(|| scored.records.first())
        .ok_or_else(|| Error::invalid_input("nothing to score"))?;

    let (raw_score, class) = (target.raw_score, target.class);
    let persisted = store.write_score(&identity, raw_score, class)?;

    Ok(SingleScore {
        identity,
        raw_score,
        class,
        thresholds: scored.thresholds,
        persisted,
    })
}

/// Options of the `score` command
pub struct ScoreConfig {
    pub store: PathBuf,
    pub document: PathBuf,
    pub sample_size: usize,
    pub pipeline: PipelineConfig,
    pub dry_run: bool,
    pub output: OutputOptions,
}

pub fn handle_score(config: ScoreConfig) -> anyhow::Result<()> {
    let _store = set_store(&config.store);
    let (doc, mut store) = {
        let _phase = set_phase(Phase::Loading);
        (read_record(&config.document)?, JsonFileStore::open(&config.store)?)
    };
    let result = score_and_update(&doc, &mut store, &config.pipeline, config.sample_size)?;
    if !config.dry_run {
        let _phase = set_phase(Phase::WritingBack);
        store.flush()?;
    }
    emit_report(&Report::Single(&result), &config.output)
}
