use crate::io::{create_writer, OutputFormat, Report};
use crate::observability::{set_phase, Phase};
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Where and how a command prints its report
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    /// File to write instead of stdout
    pub output: Option<PathBuf>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Terminal,
            output: None,
        }
    }
}

pub fn emit_report(report: &Report<'_>, options: &OutputOptions) -> anyhow::Result<()> {
    let _phase = set_phase(Phase::Reporting);
    let sink: Box<dyn Write> = match &options.output {
        Some(path) => {
            // No ANSI escapes in files
            colored::control::set_override(false);
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = create_writer(options.format, sink);
    writer.write_report(report)
}
