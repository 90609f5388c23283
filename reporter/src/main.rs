//! Main entry point for the reporter binary
//!
//! Reads plain-text case files, runs the batch pipeline against the Gemini
//! backend, and writes the rendered artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use reporter::services::{EnvApiKeySource, FsReportStore, GeminiBackend};
use reporter::traits::{ApiKeySource, ReportStore};
use reporter::{InstructionSet, ReportOrchestrator, ReporterConfig, ReporterError};
use shared::{logging, CaseInput, ConcurrencyConfig, GenerationConfig, RetryConfig};

/// Batch ultrasound report generation from raw findings text
#[derive(Parser)]
#[command(name = "reporter")]
#[command(about = "Generates structured ultrasound reports from per-patient findings text")]
struct Args {
    /// Input case file, or directory of .txt case files (label = file stem)
    #[arg(long)]
    input: PathBuf,

    /// Output directory for rendered artifacts
    #[arg(long, default_value = "./output")]
    output: PathBuf,

    /// Batch date used in the artifact file name (defaults to today)
    #[arg(long)]
    date: Option<String>,

    /// Backend model identifier
    #[arg(long, default_value = "gemini-2.5-flash")]
    model: String,

    /// Study type rendered in report titles
    #[arg(long, default_value = "Abdomen")]
    exam_type: String,

    /// Concurrent section generation calls per case
    #[arg(long, default_value = "8")]
    max_sections: usize,

    /// Concurrent case pipelines
    #[arg(long, default_value = "4")]
    max_cases: usize,

    /// Also write one artifact per case under <output>/cases/
    #[arg(long)]
    per_case: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init_tracing(Some(&args.log_level));
    logging::log_startup("report generation run");

    // Missing credentials are the only pre-flight fatal: fail here, before
    // any case is touched.
    let api_key = EnvApiKeySource::new()
        .get_api_key()
        .await
        .map_err(|e| ReporterError::config(e.message))?;

    let inputs = load_cases(&args.input, &args.exam_type).await?;
    anyhow::ensure!(
        !inputs.is_empty(),
        "no case files found under {}",
        args.input.display()
    );

    let generation = GenerationConfig {
        model: args.model.clone(),
        ..GenerationConfig::default()
    };
    let retry = RetryConfig::default();
    let concurrency = ConcurrencyConfig {
        max_section_tasks: args.max_sections,
        max_cases: args.max_cases,
    };
    retry.validate().map_err(ReporterError::from)?;
    concurrency.validate().map_err(ReporterError::from)?;

    let backend = Arc::new(GeminiBackend::new(api_key));
    let orchestrator = Arc::new(ReportOrchestrator::new(
        backend,
        ReporterConfig {
            generation,
            retry,
            concurrency,
            instructions: InstructionSet::default(),
        },
    ));

    let date = args
        .date
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());

    let batch = orchestrator.process_batch(inputs).await;

    let store = FsReportStore::with_base_dir(args.output.clone());
    if args.per_case {
        for outcome in batch.entries() {
            store.write_case(outcome.label(), &outcome.render()).await?;
        }
    }
    let path = store.write_batch(&date, &batch.render()).await?;

    logging::log_success(&format!("All reports saved to {}", path.display()));
    Ok(())
}

/// Collect case inputs from a file or a directory of .txt files
///
/// Directory entries are sorted by file name so batch order (and therefore
/// artifact order) is deterministic.
async fn load_cases(input: &Path, exam_type: &str) -> anyhow::Result<Vec<CaseInput>> {
    let metadata = tokio::fs::metadata(input)
        .await
        .with_context(|| format!("reading input path {}", input.display()))?;

    let mut paths = Vec::new();
    if metadata.is_dir() {
        let mut entries = tokio::fs::read_dir(input)
            .await
            .with_context(|| format!("listing case directory {}", input.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                paths.push(path);
            }
        }
        paths.sort();
    } else {
        paths.push(input.to_path_buf());
    }

    let mut cases = Vec::with_capacity(paths.len());
    for path in paths {
        let raw_text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading case file {}", path.display()))?;
        let label = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("case")
            .to_string();
        cases.push(CaseInput::new(label, raw_text).with_exam_type(exam_type));
    }
    Ok(cases)
}
