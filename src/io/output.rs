use crate::commands::{BatchSummary, SingleScore};
use crate::core::{fields, ScoredRecord, SeverityClass, Thresholds};
use crate::priority::{PopulationScores, TopCritical, TriageSelection};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

/// Anything a command can report
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Report<'a> {
    Ranking(&'a PopulationScores),
    Batch(&'a BatchSummary),
    Single(&'a SingleScore),
    Top(&'a TopCritical),
    Triage(&'a TriageSelection),
}

impl Report<'_> {
    pub fn title(&self) -> &'static str {
        match self {
            Report::Ranking(_) => "Vulnerability Ranking",
            Report::Batch(_) => "Batch Rescore",
            Report::Single(_) => "Single Record Score",
            Report::Top(_) => "Top Critical Vulnerabilities",
            Report::Triage(_) => "Triage Selection",
        }
    }

    fn thresholds(&self) -> &Thresholds {
        match self {
            Report::Ranking(r) => &r.thresholds,
            Report::Batch(r) => &r.thresholds,
            Report::Single(r) => &r.thresholds,
            Report::Top(r) => &r.thresholds,
            Report::Triage(r) => &r.thresholds,
        }
    }

    fn records(&self) -> &[ScoredRecord] {
        match self {
            Report::Ranking(r) => &r.records,
            Report::Top(r) => &r.selected,
            Report::Triage(r) => &r.selected,
            Report::Batch(_) | Report::Single(_) => &[],
        }
    }

    /// Label/value pairs summarizing the report
    fn summary(&self) -> Vec<(&'static str, String)> {
        match self {
            Report::Ranking(r) => {
                let mut rows = vec![("Records", r.len().to_string())];
                for (class, count) in r.class_counts().iter().rev() {
                    rows.push((class_heading(*class), count.to_string()));
                }
                rows
            }
            Report::Batch(r) => vec![
                ("Total", r.total.to_string()),
                ("Updated", r.updated.to_string()),
                ("Skipped", r.skipped.to_string()),
            ],
            Report::Single(r) => vec![
                ("Identity", r.identity.clone()),
                ("Raw score", format!("{:.6}", r.raw_score)),
                ("Class", r.class.to_string()),
                ("Persisted", if r.persisted { "yes" } else { "no" }.to_string()),
            ],
            Report::Top(r) => vec![
                ("Population", r.population.to_string()),
                ("Selected", r.selected.len().to_string()),
            ],
            Report::Triage(r) => vec![
                ("Population", r.population.to_string()),
                ("Suppressed", r.suppressed.to_string()),
                ("Threshold used", format!("{:.6}", r.threshold_used)),
                ("Selected", r.selected.len().to_string()),
            ],
        }
    }
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &Report<'_>) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &Report<'_>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &Report<'_>) -> anyhow::Result<()> {
        writeln!(self.writer, "# {}", report.title())?;
        writeln!(self.writer)?;
        self.write_summary(report)?;
        self.write_thresholds(report.thresholds())?;
        self.write_records(report.records())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_summary(&mut self, report: &Report<'_>) -> anyhow::Result<()> {
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        for (label, value) in report.summary() {
            writeln!(self.writer, "| {label} | {} |", escape_markdown(&value))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_thresholds(&mut self, t: &Thresholds) -> anyhow::Result<()> {
        writeln!(self.writer, "## Thresholds")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| t1 | t2 | t3 |")?;
        writeln!(self.writer, "|----|----|----|")?;
        writeln!(self.writer, "| {} | {} | {} |", t.t1, t.t2, t.t3)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_records(&mut self, records: &[ScoredRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## Records")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "| # | ID | Name | CVE | Score | Class | Critical |"
        )?;
        writeln!(
            self.writer,
            "|---|----|------|-----|-------|-------|----------|"
        )?;
        for (rank, record) in records.iter().enumerate() {
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {} | {} | {} |",
                rank + 1,
                escape_markdown(&record.identity().unwrap_or_else(|| "-".to_string())),
                escape_markdown(text_field(record, fields::NAME)),
                escape_markdown(text_field(record, fields::CVE_ID)),
                format_score(record),
                record.class,
                if record.is_critical { "yes" } else { "" },
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &Report<'_>) -> anyhow::Result<()> {
        let title = report.title();
        writeln!(self.writer, "{}", title.bold().blue())?;
        writeln!(self.writer, "{}", "=".repeat(title.len()).blue())?;
        writeln!(self.writer)?;

        for (label, value) in report.summary() {
            writeln!(self.writer, "  {}: {}", label, value.bold())?;
        }
        let t = report.thresholds();
        writeln!(
            self.writer,
            "  {}: t1={} t2={} t3={}",
            "Thresholds".dimmed(),
            t.t1,
            t.t2,
            t.t3
        )?;
        writeln!(self.writer)?;

        let records = report.records();
        if !records.is_empty() {
            writeln!(self.writer, "{}", record_table(records))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn record_table(records: &[ScoredRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "ID", "Name", "CVE", "Score", "Class", "Critical"]);

    for (rank, record) in records.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(record.identity().unwrap_or_else(|| "-".to_string())),
            Cell::new(text_field(record, fields::NAME)),
            Cell::new(text_field(record, fields::CVE_ID)),
            Cell::new(format_score(record)),
            Cell::new(record.class).fg(class_color(record.class)),
            Cell::new(if record.is_critical { "yes" } else { "" }),
        ]);
    }
    table
}

fn class_color(class: SeverityClass) -> Color {
    match class {
        SeverityClass::Critical => Color::Red,
        SeverityClass::High => Color::Yellow,
        SeverityClass::Medium => Color::Cyan,
        SeverityClass::Low => Color::Green,
    }
}

fn class_heading(class: SeverityClass) -> &'static str {
    match class {
        SeverityClass::Critical => "Critical",
        SeverityClass::High => "High",
        SeverityClass::Medium => "Medium",
        SeverityClass::Low => "Low",
    }
}

fn text_field<'a>(record: &'a ScoredRecord, key: &str) -> &'a str {
    record
        .record
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("-")
}

fn format_score(record: &ScoredRecord) -> String {
    match record.scaled_score {
        Some(scaled) => format!("{scaled:.2} ({:.6})", record.raw_score),
        None => format!("{:.6}", record.raw_score),
    }
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|")
}

pub fn create_writer<'w>(
    format: OutputFormat,
    writer: Box<dyn Write + 'w>,
) -> Box<dyn OutputWriter + 'w> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}
