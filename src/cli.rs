use crate::config::{CutMode, PipelineConfig, RescaleConfig, WeightSet, DEFAULT_QUANTILES};
use crate::io::Query;
use crate::scoring::age::ReferenceMonth;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vulntriage")]
#[command(about = "Vulnerability urgency scoring, clustering and triage", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the nearest .vulntriage.toml)
    #[arg(long, global = true, env = "VULNTRIAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score, classify and rank a population file
    Rank {
        /// JSON array or JSON Lines file of records
        input: PathBuf,

        /// Show only top N records
        #[arg(long = "top", visible_alias = "head")]
        top: Option<usize>,

        #[command(flatten)]
        scoring: ScoringArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Recompute every score in a store and write them back
    Batch {
        /// Store file to rescore in place
        store: PathBuf,

        /// Compute without writing the store
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        scoring: ScoringArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Score one document against a sample of the store
    Score {
        /// Store file holding the population
        store: PathBuf,

        /// JSON file with the document to score
        document: PathBuf,

        /// Records sampled from the store as context
        #[arg(long, default_value_t = crate::commands::DEFAULT_SAMPLE_SIZE)]
        sample_size: usize,

        /// Compute without writing the store
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        scoring: ScoringArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the critical records of a store
    Top {
        store: PathBuf,

        /// Maximum number of records listed
        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        scoring: ScoringArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Select a fixed number of records for review
    Triage {
        store: PathBuf,

        /// Number of records selected
        #[arg(long)]
        capacity: Option<usize>,

        /// Keep records tagged "ok" in the pool
        #[arg(long)]
        no_suppress: bool,

        #[command(flatten)]
        scoring: ScoringArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl From<OutputArgs> for crate::commands::OutputOptions {
    fn from(args: OutputArgs) -> Self {
        Self {
            format: args.format.into(),
            output: args.output,
        }
    }
}

/// Scoring overrides shared by every scoring command
#[derive(Args, Debug, Clone, Default)]
pub struct ScoringArgs {
    /// Feature or field weight, NAME=WEIGHT (repeatable)
    #[arg(long = "weight", value_name = "NAME=WEIGHT", value_parser = WeightSet::parse_pair)]
    pub weights: Vec<(String, f64)>,

    /// Score these record fields instead of the canonical features
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Score exactly the fields named by the weights
    #[arg(long, conflicts_with = "fields")]
    pub weight_fields: bool,

    /// How thresholds are derived
    #[arg(long, value_enum)]
    pub cut_mode: Option<CutModeArg>,

    /// Three quantiles for quantile cuts, e.g. 0.5,0.8,0.95
    #[arg(long, value_parser = parse_quantiles)]
    pub quantiles: Option<[f64; 3]>,

    /// Map raw scores onto 0-100 before cutting
    #[arg(long)]
    pub rescale: bool,

    /// 0-100 scores, quantile cuts and a minimum critical count
    #[arg(long)]
    pub legacy: bool,

    /// Month ages are measured against, YYYY-MM
    #[arg(long, value_parser = parse_reference_month)]
    pub reference_date: Option<ReferenceMonth>,

    /// Only records whose FIELD equals VALUE (repeatable)
    #[arg(long = "query", value_name = "FIELD=VALUE", value_parser = Query::parse_condition)]
    pub query: Vec<(String, Value)>,
}

impl ScoringArgs {
    /// Layer the command line over a configuration-file pipeline.
    pub fn apply(&self, base: PipelineConfig) -> PipelineConfig {
        let mut config = base;

        if self.legacy {
            config.cut_mode = CutMode::Quantiles;
            config.quantiles = DEFAULT_QUANTILES;
            config.rescale = Some(config.rescale.unwrap_or_default());
            config.critical_floor = Some(config.critical_floor.unwrap_or_default());
        }
        if !self.weights.is_empty() {
            let overrides: WeightSet = self.weights.iter().cloned().collect();
            config.weights = config.weights.merged_with(&overrides);
        }
        if let Some(fields) = &self.fields {
            config = config.with_fields(fields.clone());
        }
        if self.weight_fields {
            config = config.with_weight_fields();
        }
        if let Some(cut_mode) = self.cut_mode {
            config.cut_mode = cut_mode.into();
        }
        if let Some(quantiles) = self.quantiles {
            config.quantiles = quantiles;
        }
        if self.rescale && config.rescale.is_none() {
            config.rescale = Some(RescaleConfig::default());
        }
        if let Some(reference) = self.reference_date {
            config.reference = Some(reference);
        }

        config.sanitized()
    }

    pub fn query(&self) -> Query {
        self.query.iter().cloned().collect()
    }
}

fn parse_quantiles(text: &str) -> Result<[f64; 3], String> {
    let values = text
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid quantile '{}': {e}", part.trim()))
        })
        .collect::<Result<Vec<f64>, String>>()?;
    <[f64; 3]>::try_from(values)
        .map_err(|v| format!("expected three quantiles, got {}", v.len()))
}

fn parse_reference_month(text: &str) -> Result<ReferenceMonth, String> {
    ReferenceMonth::parse(text).ok_or_else(|| format!("expected YYYY-MM, got '{text}'"))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

impl From<OutputFormat> for crate::io::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => crate::io::OutputFormat::Json,
            OutputFormat::Markdown => crate::io::OutputFormat::Markdown,
            OutputFormat::Terminal => crate::io::OutputFormat::Terminal,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CutModeArg {
    /// One-dimensional k-means with four clusters
    Kmeans,
    /// Fixed quantiles of the score distribution
    Quantiles,
}

impl From<CutModeArg> for CutMode {
    fn from(mode: CutModeArg) -> Self {
        match mode {
            CutModeArg::Kmeans => CutMode::Kmeans,
            CutModeArg::Quantiles => CutMode::Quantiles,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CriticalFloor, TOP_CRITICAL_QUANTILES};
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn output_format_conversion() {
        assert_eq!(
            crate::io::OutputFormat::from(OutputFormat::Json),
            crate::io::OutputFormat::Json
        );
        assert_eq!(
            crate::io::OutputFormat::from(OutputFormat::Markdown),
            crate::io::OutputFormat::Markdown
        );
    }

    #[test]
    fn rank_command_parses_scoring_overrides() {
        let cli = parse(&[
            "vulntriage",
            "rank",
            "vulns.json",
            "--weight",
            "epss=2",
            "--weight",
            "age=-1",
            "--cut-mode",
            "quantiles",
            "--quantiles",
            "0.4,0.7,0.9",
            "--reference-date",
            "2025-06",
            "--format",
            "json",
            "--top",
            "5",
        ]);
        match cli.command {
            Commands::Rank {
                input,
                top,
                scoring,
                output,
            } => {
                assert_eq!(input, PathBuf::from("vulns.json"));
                assert_eq!(top, Some(5));
                assert_eq!(output.format, OutputFormat::Json);

                let config = scoring.apply(PipelineConfig::default());
                assert_eq!(config.weights.weight_for_field("epss"), 2.0);
                assert_eq!(config.weights.weight_for_field("age"), -1.0);
                assert_eq!(config.cut_mode, CutMode::Quantiles);
                assert_eq!(config.quantiles, [0.4, 0.7, 0.9]);
                assert_eq!(config.reference, Some(ReferenceMonth::new(2025, 6)));
            }
            _ => panic!("Expected Rank command"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = parse(&["vulntriage", "init", "--force", "-vv", "--config", "x.toml"]);
        assert_eq!(cli.verbosity, 2);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Commands::Init { force } => assert!(force),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(Cli::try_parse_from(["vulntriage", "rank", "f", "--weight", "epss"]).is_err());
        assert!(Cli::try_parse_from(["vulntriage", "rank", "f", "--quantiles", "0.5,0.9"]).is_err());
        assert!(
            Cli::try_parse_from(["vulntriage", "rank", "f", "--reference-date", "soon"]).is_err()
        );
        assert!(Cli::try_parse_from([
            "vulntriage",
            "rank",
            "f",
            "--fields",
            "a",
            "--weight-fields"
        ])
        .is_err());
    }

    #[test]
    fn weight_fields_selects_weighted_fields() {
        let args = ScoringArgs {
            weights: vec![("risk".into(), 1.0), ("reach".into(), 0.5)],
            weight_fields: true,
            ..ScoringArgs::default()
        };
        let config = args.apply(PipelineConfig::default());
        assert_eq!(
            config.custom_fields(),
            Some(&["reach".to_string(), "risk".to_string()][..])
        );
    }

    #[test]
    fn legacy_preset_keeps_file_floor() {
        let base = PipelineConfig {
            critical_floor: Some(CriticalFloor {
                top_frac: 0.2,
                min_count: 1,
            }),
            ..PipelineConfig::default()
        };
        let args = ScoringArgs {
            legacy: true,
            ..ScoringArgs::default()
        };
        let config = args.apply(base);
        assert_eq!(config.cut_mode, CutMode::Quantiles);
        assert!(config.rescale.is_some());
        assert_eq!(config.critical_floor.map(|f| f.min_count), Some(1));
    }

    #[test]
    fn no_overrides_leave_base_untouched() {
        let base = PipelineConfig::default()
            .with_cut_mode(CutMode::Quantiles)
            .with_quantiles(TOP_CRITICAL_QUANTILES);
        assert_eq!(ScoringArgs::default().apply(base.clone()), base);
    }

    #[test]
    fn query_conditions_collect() {
        let cli = parse(&[
            "vulntriage",
            "top",
            "store.json",
            "--query",
            "team=web",
            "--query",
            "exposed=true",
        ]);
        match cli.command {
            Commands::Top { scoring, .. } => {
                let query = scoring.query();
                assert_eq!(
                    query.conditions(),
                    &[
                        ("team".to_string(), json!("web")),
                        ("exposed".to_string(), json!(true))
                    ]
                );
            }
            _ => panic!("Expected Top command"),
        }
    }
}
