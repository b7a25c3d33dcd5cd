// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod observability;
pub mod priority;
pub mod scoring;

// Re-export commonly used types
pub use crate::core::{
    Error, Feature, FeatureVector, Record, Result, ScoredRecord, SeverityClass, Thresholds,
};

pub use crate::config::{CutMode, PipelineConfig, VulnTriageConfig, WeightSet};

pub use crate::io::{create_writer, OutputFormat, OutputWriter, PopulationSource, Query, ScoreSink};

pub use crate::priority::{
    derive_thresholds, score_population, top_critical, triage_select, PopulationScores,
    TopCritical, TriageSelection,
};

pub use crate::scoring::normalize_record;

pub use crate::commands::{batch_score_and_update, score_and_update, BatchSummary, SingleScore};
