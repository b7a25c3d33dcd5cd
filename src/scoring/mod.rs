//! Raw-score computation: normalization, age scoring, robust
//! standardization and weighted aggregation.

pub mod age;
pub mod aggregator;
pub mod normalizer;
pub mod robust;

pub use age::{AgeConfig, DecayMode, ReferenceMonth};
pub use aggregator::{compute_raw_scores, RawScoredRecord};
pub use normalizer::normalize_record;
pub use robust::{percentile, robust_z_scores};
