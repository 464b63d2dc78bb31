//! CLI entry point for the HealthGuard dataset cleaner.

use anyhow::{Result, anyhow};
use chrono::Local;
use clap::Parser;
use dotenv::dotenv;
use healthguard_processing::{
    CleaningOutcome, ColumnStatistics, DatasetSession, DatasetSummary, IngestReport, Preview,
    SessionConfig, SessionStatus,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clinical CSV cleaning and statistics",
    long_about = "Uploads a CSV dataset, repairs it and answers questions about the result.\n\n\
                  The cleaning pipeline trims text cells, treats 0 as missing in critical\n\
                  columns, fills missing numbers with the column mean and drops duplicate rows.\n\n\
                  EXAMPLES:\n  \
                  # Clean a dataset and print a summary\n  \
                  healthguard -i diabetes.csv --summary\n\n  \
                  # Ask questions about the cleaned data\n  \
                  healthguard -i diabetes.csv --ask \"how many rows?\" --ask \"mean values\"\n\n  \
                  # Reuse the last cleaned dataset without re-uploading\n  \
                  healthguard --resume -o output --summary --json"
)]
struct Args {
    /// Path to the CSV file to upload
    #[arg(short, long, required_unless_present = "resume")]
    input: Option<String>,

    /// Directory the cleaned dataset is written to
    #[arg(short, long, default_value = "./output")]
    output: String,

    /// File name of the cleaned dataset (without extension)
    #[arg(long, default_value = "cleaned_data")]
    output_name: String,

    /// Columns in which 0 means "not measured" (comma separated)
    ///
    /// Defaults to Glucose, BloodPressure, BMI, Insulin, SkinThickness
    #[arg(long, value_delimiter = ',')]
    critical_columns: Option<Vec<String>>,

    /// Question to answer about the cleaned dataset (repeatable)
    #[arg(short, long)]
    ask: Vec<String>,

    /// Print descriptive statistics of the cleaned dataset
    #[arg(long)]
    summary: bool,

    /// Also write the cleaned dataset here (file, or directory for a timestamped name)
    #[arg(long)]
    export: Option<PathBuf>,

    /// Keep the cleaned dataset in memory only
    #[arg(long)]
    no_save: bool,

    /// Skip upload and cleaning; load the cleaned dataset from the output directory
    #[arg(long, conflicts_with = "input")]
    resume: bool,

    /// Number of rows shown in previews
    #[arg(long, default_value = "10")]
    preview_rows: usize,

    /// Output JSON to stdout instead of human-readable text
    ///
    /// Disables all logs; only the JSON document is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Everything one invocation produced, in the order it happened.
#[derive(Debug, Default, Serialize)]
struct RunOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    uploaded: Option<IngestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cleaned: Option<CleaningOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<DatasetSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    answers: Vec<Answer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exported_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<Preview>,
}

#[derive(Debug, Serialize)]
struct Answer {
    question: String,
    answer: String,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .output_dir(&args.output)
        .output_name(&args.output_name)
        .save_to_disk(!args.no_save)
        .preview_rows(args.preview_rows);

    if let Some(ref columns) = args.critical_columns {
        builder = builder.critical_columns(columns.iter().map(|c| c.trim().to_string()));
    }

    Ok(builder.build()?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    let config = build_config(&args)?;
    let mut output = RunOutput::default();

    let session = if args.resume {
        info!("Resuming from {}", config.persisted_path().display());
        let session = DatasetSession::resume(config)?;
        output.preview = Some(session.preview(session.config().preview_rows)?);
        session
    } else {
        let input = args
            .input
            .as_deref()
            .ok_or_else(|| anyhow!("--input is required unless --resume is given"))?;
        if !Path::new(input).exists() {
            return Err(anyhow!("Input file not found: {}", input));
        }

        let session = DatasetSession::new(config)?;

        info!("Uploading dataset from: {}", input);
        let uploaded = session.ingest_file(input)?;
        info!(
            "Dataset uploaded: {} rows x {} columns",
            uploaded.table.row_count, uploaded.table.column_count
        );
        output.uploaded = Some(uploaded);

        let outcome = session.clean().inspect_err(|e| error!("Cleaning failed: {}", e))?;
        output.cleaned = Some(outcome);
        session
    };

    if args.summary {
        output.summary = Some(session.summarize()?);
    }

    for question in &args.ask {
        output.answers.push(Answer {
            question: question.clone(),
            answer: session.answer(question)?,
        });
    }

    if let Some(ref target) = args.export {
        let path = export_target(target, &session.config().output_name);
        output.exported_to = Some(session.export_to(&path)?);
    }

    output.status = Some(session.status());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_human_readable(&output);
    }

    Ok(())
}

/// A directory gets a timestamped file name; anything else is used as is.
fn export_target(target: &Path, output_name: &str) -> PathBuf {
    if target.is_dir() {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        target.join(format!("{}_{}.csv", output_name, timestamp))
    } else {
        target.to_path_buf()
    }
}

/// Print the run results for a terminal.
///
/// Uses `println!` rather than logging so the results are visible
/// regardless of log level.
fn print_human_readable(output: &RunOutput) {
    if let Some(ref uploaded) = output.uploaded {
        println!();
        println!("{}", "=".repeat(80));
        println!("UPLOADED");
        println!("{}", "=".repeat(80));
        println!(
            "  {} rows x {} columns",
            uploaded.table.row_count, uploaded.table.column_count
        );
        for col in &uploaded.table.columns {
            println!(
                "  {:<24} {:<10} {} missing",
                truncate_str(&col.name, 23),
                col.dtype,
                col.null_count
            );
        }
    }

    if let Some(ref cleaned) = output.cleaned {
        let report = &cleaned.report;
        println!();
        println!("{}", "=".repeat(80));
        println!("CLEANED");
        println!("{}", "=".repeat(80));
        println!("  Duration: {}ms", report.duration_ms);
        println!(
            "  Rows: {} -> {} ({} duplicates removed)",
            report.rows_before, report.rows_after, report.duplicates_removed
        );
        println!("  Actions:");
        for action in &report.actions {
            println!("    - {}", action);
        }
        if let Some(ref path) = cleaned.persisted_path {
            println!("  Saved to: {}", path.display());
        }
        print_preview(&cleaned.preview);
    }

    if let Some(ref preview) = output.preview {
        println!();
        println!("Resumed dataset ({} rows):", preview.total_rows);
        print_preview(preview);
    }

    if let Some(ref summary) = output.summary {
        print_summary(summary);
    }

    if !output.answers.is_empty() {
        println!();
        for qa in &output.answers {
            println!("Q: {}", qa.question);
            println!("A: {}", qa.answer);
        }
    }

    if let Some(ref path) = output.exported_to {
        println!();
        println!("Exported cleaned dataset to: {}", path.display());
    }
}

fn print_preview(preview: &Preview) {
    println!();
    println!("  {}", preview.columns.join(" | "));
    for row in &preview.rows {
        let cells: Vec<String> = preview
            .columns
            .iter()
            .map(|c| match row.get(c) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(v) => v.to_string(),
                None => String::new(),
            })
            .collect();
        println!("  {}", cells.join(" | "));
    }
    if preview.total_rows > preview.rows.len() {
        println!("  ... {} more rows", preview.total_rows - preview.rows.len());
    }
}

fn print_summary(summary: &DatasetSummary) {
    println!();
    println!("{}", "=".repeat(80));
    println!(
        "SUMMARY ({} rows x {} columns)",
        summary.row_count, summary.column_count
    );
    println!("{}", "=".repeat(80));

    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| format!("{:.2}", x));

    for name in &summary.columns {
        let missing = summary.missing.get(name).copied().unwrap_or(0);
        match summary.statistics.get(name) {
            Some(ColumnStatistics::Numeric {
                count,
                mean,
                std,
                min,
                p50,
                max,
                ..
            }) => println!(
                "  {:<24} n={:<6} mean={:<10} std={:<10} min={:<10} median={:<10} max={:<10} missing={}",
                truncate_str(name, 23),
                count,
                fmt(*mean),
                fmt(*std),
                fmt(*min),
                fmt(*p50),
                fmt(*max),
                missing
            ),
            Some(ColumnStatistics::Categorical {
                count,
                unique,
                top,
                freq,
            }) => println!(
                "  {:<24} n={:<6} unique={:<6} top={} ({}) missing={}",
                truncate_str(name, 23),
                count,
                unique,
                top.as_deref().unwrap_or("-"),
                freq.unwrap_or(0),
                missing
            ),
            None => {}
        }
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
