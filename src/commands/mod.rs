//! CLI command implementations for vulntriage operations.
//!
//! Each submodule pairs a store-agnostic operation, generic over the
//! [`PopulationSource`](crate::io::PopulationSource) and
//! [`ScoreSink`](crate::io::ScoreSink) traits, with a `handle_*` entry
//! point that binds it to a JSON store file and prints a report.
//!
//! Available commands:
//! - **rank**: Score and rank a population
//! - **batch**: Recompute and persist scores for a whole population
//! - **score**: Score one document against a sample and persist it
//! - **top**: List the critical records of a population
//! - **triage**: Capacity-bounded selection for a review queue
//! - **init**: Write a default configuration file

pub mod batch;
pub mod init;
pub mod rank;
mod report;
pub mod score;
pub mod top;
pub mod triage;

pub use batch::{batch_score_and_update, handle_batch, BatchConfig, BatchSummary};
pub use init::init_config;
pub use rank::{handle_rank, rank_population, RankConfig};
pub use report::{emit_report, OutputOptions};
pub use score::{handle_score, score_and_update, ScoreConfig, SingleScore, DEFAULT_SAMPLE_SIZE};
pub use top::{handle_top, select_top_critical, TopConfig};
pub use triage::{handle_triage, select_for_triage, TriageConfig};
