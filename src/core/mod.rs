pub mod errors;
pub mod record;
pub mod types;

pub use errors::{Error, Result, ResultExt};
pub use record::{fields, lenient_f64, Record, CONTENT_KEY_FIELDS};
pub use types::{Feature, FeatureVector, ScoredRecord, SeverityClass, Thresholds};
