//! Configuration: the `.vulntriage.toml` file schema, its discovery, and
//! the sanitized runtime settings derived from it.

mod accessors;
mod core;
pub mod lenient;
mod loader;
pub mod pipeline;
pub mod scoring;

pub use accessors::{TriageSettings, DEFAULT_TOP_LIMIT, DEFAULT_TRIAGE_CAPACITY};
pub use self::core::{PipelineSection, TopSection, TriageSection, VulnTriageConfig};
pub use loader::{
    directory_ancestors, load_config, load_config_file, load_config_from, parse_config,
    CONFIG_FILE_NAME,
};
pub use pipeline::{
    sanitize_quantiles, CriticalFloor, CutMode, PipelineConfig, RescaleConfig,
    DEFAULT_QUANTILES, TOP_CRITICAL_QUANTILES,
};
pub use scoring::{parse_weight, sanitize_weight, WeightSet, DEFAULT_WEIGHT, MAX_WEIGHT, MIN_WEIGHT};
