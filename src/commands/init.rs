use crate::config::CONFIG_FILE_NAME;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"# vulntriage configuration

# Signed feature weights. Keys may also name record fields
# (epss, cvss, cve, companyCriticality, date).
[weights]
severity = 1.0
exploit_probability = 1.0
criticality = 1.0
age = 1.0

[pipeline]
# "kmeans" or "quantiles"
cut_mode = "kmeans"
quantiles = [0.5, 0.8, 0.95]
z_cap = 3.0
# Map raw scores onto 0-100 before cutting
rescale = false
# Month ages are measured against; defaults to the current month
# reference_date = "2025-06"

[age]
horizon_months = 60
# "exponential" or "linear"
decay = "exponential"
rate = 3.0

# Flag at least this many records critical
# [critical_floor]
# top_frac = 0.10
# min_count = 5

[triage]
capacity = 20
suppress_ok = true

[top]
limit = 30
cut_mode = "quantiles"
quantiles = [0.60, 0.85, 0.97]
"#;

/// Write a commented default configuration into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);

    Ok(config_path)
}
