//! Severity classes and selections derived from raw scores.

pub mod classifier;
pub mod pipeline;
pub mod thresholds;
pub mod triage;

pub use classifier::{classify, classify_population, critical_floor_count};
pub use pipeline::{score_population, PopulationScores};
pub use thresholds::{derive_thresholds, CutMethod, DerivedThresholds};
pub use triage::{has_suppression_marker, top_critical, triage_select, TopCritical, TriageSelection};
