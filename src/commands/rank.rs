use super::report::{emit_report, OutputOptions};
use crate::config::PipelineConfig;
use crate::core::Result;
use crate::io::{JsonFileStore, PopulationSource, Query, Report};
use crate::observability::{set_phase, set_store, Phase};
use crate::priority::{score_population, PopulationScores};
use std::path::PathBuf;

/// Score the records matching `query` and keep the `top` best, if bounded.
///
/// Thresholds are always derived from the whole matching population, so
/// truncation never changes a record's class.
pub fn rank_population<S>(
    source: &S,
    query: &Query,
    config: &PipelineConfig,
    top: Option<usize>,
) -> Result<PopulationScores>
where
    S: PopulationSource + ?Sized,
{
    let records = source.fetch(query)?;
    let mut scored = score_population(&records, config);
    if let Some(limit) = top {
        scored.records.truncate(limit);
    }
    Ok(scored)
}

/// Options of the `rank` command
pub struct RankConfig {
    pub input: PathBuf,
    pub query: Query,
    pub top: Option<usize>,
    pub pipeline: PipelineConfig,
    pub output: OutputOptions,
}

pub fn handle_rank(config: RankConfig) -> anyhow::Result<()> {
    let _store = set_store(&config.input);
    let store = {
        let _phase = set_phase(Phase::Loading);
        JsonFileStore::open(&config.input)?
    };
    let scored = rank_population(&store, &config.query, &config.pipeline, config.top)?;
    emit_report(&Report::Ranking(&scored), &config.output)
}
