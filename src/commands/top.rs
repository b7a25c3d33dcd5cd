//! List the critical records of a store.

use super::report::{emit_report, OutputOptions};
use crate::config::PipelineConfig;
use crate::core::Result;
use crate::io::{JsonFileStore, PopulationSource, Query, Report};
use crate::observability::{set_phase, set_store, Phase};
use crate::priority::{top_critical, TopCritical};
use std::path::PathBuf;

/// Fetch the matching population and keep its critical records, best first.
pub fn select_top_critical<S>(
    source: &S,
    config: &PipelineConfig,
    limit: usize,
    query: &Query,
) -> Result<TopCritical>
where
    S: PopulationSource + ?Sized,
{
    let records = source.fetch(query)?;
    Ok(top_critical(&records, limit, config))
}

/// Options of the `top` command
pub struct TopConfig {
    pub store: PathBuf,
    pub query: Query,
    pub limit: usize,
    pub pipeline: PipelineConfig,
    pub output: OutputOptions,
}

pub fn handle_top(config: TopConfig) -> anyhow::Result<()> {
    let _store = set_store(&config.store);
    let store = {
        let _phase = set_phase(Phase::Loading);
        JsonFileStore::open(&config.store)?
    };
    let top = select_top_critical(&store, &config.pipeline, config.limit, &config.query)?;
    emit_report(&Report::Top(&top), &config.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CutMode, TOP_CRITICAL_QUANTILES};
    use crate::core::{Record, SeverityClass};
    use crate::io::MemoryStore;
    use crate::scoring::age::ReferenceMonth;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
            .with_reference(ReferenceMonth::new(2025, 6))
            .with_cut_mode(CutMode::Quantiles)
            .with_quantiles(TOP_CRITICAL_QUANTILES)
    }

    fn store() -> MemoryStore {
        MemoryStore::new(
            (0..40i32)
                .map(|i| {
                    Record::new()
                        .with_field("_id", i)
                        .with_field("cve", f64::from(i) * 0.25)
                        .with_field("group", if i < 20 { "a" } else { "b" })
                })
                .collect(),
        )
    }

    #[test]
    fn only_critical_records_are_returned() {
        let top = select_top_critical(&store(), &config(), 30, &Query::all()).unwrap();
        assert_eq!(top.population, 40);
        assert!(!top.selected.is_empty());
        assert!(top
            .selected
            .iter()
            .all(|r| r.class == SeverityClass::Critical));
    }

    #[test]
    fn limit_truncates_selection() {
        let top = select_top_critical(&store(), &config(), 1, &Query::all()).unwrap();
        assert_eq!(top.selected.len(), 1);
    }

    #[test]
    fn query_narrows_population() {
        let query = Query::all().with("group", "b");
        let top = select_top_critical(&store(), &config(), 30, &query).unwrap();
        assert_eq!(top.population, 20);
    }
}
