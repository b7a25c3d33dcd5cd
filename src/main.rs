use anyhow::Result;
use vulntriage::cli::{parse_args, Cli, Commands};
use vulntriage::commands::{
    self, BatchConfig, RankConfig, ScoreConfig, TopConfig, TriageConfig,
};
use vulntriage::config::{load_config, load_config_file, VulnTriageConfig};
use vulntriage::observability::{init_tracing, install_panic_hook};

fn main() -> Result<()> {
    install_panic_hook();
    let cli = parse_args();
    init_tracing(cli.verbosity);

    let file_config = resolve_config(&cli)?;
    run(cli.command, &file_config)
}

// An explicit --config must load; a discovered one falls back to defaults
fn resolve_config(cli: &Cli) -> Result<VulnTriageConfig> {
    match &cli.config {
        Some(path) => Ok(load_config_file(path)?),
        None => Ok(load_config()),
    }
}

fn run(command: Commands, file_config: &VulnTriageConfig) -> Result<()> {
    match command {
        Commands::Rank {
            input,
            top,
            scoring,
            output,
        } => commands::handle_rank(RankConfig {
            input,
            query: scoring.query(),
            top,
            pipeline: scoring.apply(file_config.pipeline_config()),
            output: output.into(),
        }),
        Commands::Batch {
            store,
            dry_run,
            scoring,
            output,
        } => commands::handle_batch(BatchConfig {
            store,
            query: scoring.query(),
            pipeline: scoring.apply(file_config.pipeline_config()),
            dry_run,
            output: output.into(),
        }),
        Commands::Score {
            store,
            document,
            sample_size,
            dry_run,
            scoring,
            output,
        } => commands::handle_score(ScoreConfig {
            store,
            document,
            sample_size,
            pipeline: scoring.apply(file_config.pipeline_config()),
            dry_run,
            output: output.into(),
        }),
        Commands::Top {
            store,
            limit,
            scoring,
            output,
        } => commands::handle_top(TopConfig {
            store,
            query: scoring.query(),
            limit: limit.unwrap_or_else(|| file_config.top_limit()),
            pipeline: scoring.apply(file_config.top_pipeline_config()),
            output: output.into(),
        }),
        Commands::Triage {
            store,
            capacity,
            no_suppress,
            scoring,
            output,
        } => {
            let mut settings = file_config.triage_settings();
            if let Some(capacity) = capacity {
                settings.capacity = capacity;
            }
            if no_suppress {
                settings.suppress_ok = false;
            }
            commands::handle_triage(TriageConfig {
                store,
                query: scoring.query(),
                settings,
                pipeline: scoring.apply(file_config.pipeline_config()),
                output: output.into(),
            })
        }
        Commands::Init { force } => {
            let dir = std::env::current_dir()?;
            commands::init_config(&dir, force)?;
            Ok(())
        }
    }
}
