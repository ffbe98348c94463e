//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invp_core::{ClientError, JobResult};

use super::config::load_settings;
use super::parse::{WaitArgs, build_service, ctrl_c, format_result, is_supported};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for one JSON file per invoice
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Pretty-print the JSON results
    #[arg(long)]
    pretty: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    wait: WaitArgs,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    job: Option<JobResult>,
    error: Option<String>,
    processing_time_ms: u64,
    finished_at: DateTime<Utc>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let settings = load_settings(config_path)?;
    let service = build_service(&settings, args.wait)?;

    let files = expand_inputs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Jobs run one after another; each waits for its own result.
    let mut results = Vec::with_capacity(files.len());
    let cancel = ctrl_c();
    tokio::pin!(cancel);

    for path in files {
        let file_start = Instant::now();
        let result = service.parse_invoice_until(&path, &mut cancel).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(job) => {
                if let Some(output_dir) = &args.output_dir {
                    let output_path = output_path_for(output_dir, &path);
                    fs::write(&output_path, format_result(job.payload.as_str(), args.pretty)?)?;
                    debug!("Wrote output to {}", output_path.display());
                }

                results.push(ProcessResult {
                    path,
                    job: Some(job),
                    error: None,
                    processing_time_ms,
                    finished_at: Utc::now(),
                });
            }
            Err(ClientError::Cancelled) => {
                overall_pb.abandon();
                anyhow::bail!("Cancelled after {} files", results.len());
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        job: None,
                        error: Some(error_msg),
                        processing_time_ms,
                        finished_at: Utc::now(),
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    overall_pb.abandon();
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    if args.output_dir.is_none() {
        for result in &results {
            if let Some(job) = &result.job {
                println!("{}", format_result(job.payload.as_str(), args.pretty)?);
            }
        }
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Expand a glob pattern to the supported invoice files it matches.
fn expand_inputs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    files.sort();
    Ok(files)
}

fn output_path_for(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    output_dir.join(format!("{}.json", stem))
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "job_id",
        "job_type",
        "processing_time_ms",
        "finished_at",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let processing_time_ms = result.processing_time_ms.to_string();
        let finished_at = result.finished_at.to_rfc3339();

        match &result.job {
            Some(job) => wtr.write_record([
                filename,
                "success",
                job.id.as_deref().unwrap_or(""),
                job.job_type.as_deref().unwrap_or(""),
                &processing_time_ms,
                &finished_at,
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "error",
                "",
                "",
                &processing_time_ms,
                &finished_at,
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
