//! Field-level tolerance for configuration files.
//!
//! A value of the wrong type or out of its type's range is logged and
//! dropped, so the field takes its default and the rest of the file still
//! applies.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;

/// `deserialize_with` helper: `Some(T)`, or `None` with a warning.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(from_value(value))
}

/// Convert a parsed TOML value, warning instead of failing.
pub fn from_value<T: DeserializeOwned>(value: toml::Value) -> Option<T> {
    match value.clone().try_into::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Ignoring invalid config value {value}: {e}");
            None
        }
    }
}
