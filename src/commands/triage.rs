use super::report::{emit_report, OutputOptions};
use crate::config::{PipelineConfig, TriageSettings};
use crate::core::Result;
use crate::io::{JsonFileStore, PopulationSource, Query, Report};
use crate::observability::{set_phase, set_store, Phase};
use crate::priority::{triage_select, TriageSelection};
use std::path::PathBuf;

/// Capacity-bounded selection over the records matching `query`.
pub fn select_for_triage<S>(
    source: &S,
    config: &PipelineConfig,
    settings: TriageSettings,
    query: &Query,
) -> Result<TriageSelection>
where
    S: PopulationSource + ?Sized,
{
    let records = source.fetch(query)?;
    Ok(triage_select(
        &records,
        settings.capacity,
        settings.suppress_ok,
        config,
    ))
}

/// Options of the `triage` command
pub struct TriageConfig {
    pub store: PathBuf,
    pub query: Query,
    pub settings: TriageSettings,
    pub pipeline: PipelineConfig,
    pub output: OutputOptions,
}

pub fn handle_triage(config: TriageConfig) -> anyhow::Result<()> {
    let _store = set_store(&config.store);
    let store = {
        let _phase = set_phase(Phase::Loading);
        JsonFileStore::open(&config.store)?
    };
    let selection = select_for_triage(&store, &config.pipeline, config.settings, &config.query)?;
    emit_report(&Report::Triage(&selection), &config.output)
}
