//! Parse command - send a single invoice to the API and print the result.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invp_core::{ClientConfig, ClientError, InvoiceParserService, Settings};

use super::config::load_settings;

/// Invoice file types the API accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tif", "tiff"];

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Invoice file (PDF, TIFF, JPG or PNG)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,

    #[command(flatten)]
    wait: WaitArgs,
}

/// Polling overrides shared by parse and batch.
#[derive(Args, Clone, Copy)]
pub struct WaitArgs {
    /// Seconds between status checks (overrides config)
    #[arg(long)]
    interval: Option<u64>,

    /// Maximum seconds to wait for the job (overrides config)
    #[arg(long, conflicts_with = "wait_forever")]
    max_wait: Option<u64>,

    /// Wait until the job finishes, however long it takes (Ctrl-C to abort)
    #[arg(long)]
    wait_forever: bool,
}

/// Whether the file extension is one the API accepts.
pub fn is_supported(path: &std::path::Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&extension.as_str())
}

/// Build the service from settings plus command-line overrides.
pub fn build_service(settings: &Settings, wait: WaitArgs) -> anyhow::Result<InvoiceParserService> {
    let mut settings = settings.clone();

    if let Some(interval) = wait.interval {
        settings.api_job_status_polling_interval = interval;
    }
    if let Some(max_wait) = wait.max_wait {
        settings.api_job_status_polling_wait = max_wait;
        settings.api_job_status_polling_unbounded = false;
    }
    if wait.wait_forever {
        settings.api_job_status_polling_unbounded = true;
    }

    let config = ClientConfig::from_settings(&settings)?;
    debug!("Client config: {:?}", config);

    Ok(InvoiceParserService::new(config)?)
}

/// Resolves when the user presses Ctrl-C.
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; never cancel.
        std::future::pending::<()>().await;
    }
}

/// Render the result JSON, optionally pretty-printed.
pub fn format_result(json: &str, pretty: bool) -> anyhow::Result<String> {
    if pretty {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(json.to_string())
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_supported(&args.input) {
        anyhow::bail!(
            "Unsupported file format: {} (expected one of {})",
            args.input.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }

    let settings = load_settings(config_path)?;
    let service = build_service(&settings, args.wait)?;

    info!("Parsing invoice: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Waiting for {}...", args.input.display()));

    let result = service.parse_invoice_until(&args.input, ctrl_c()).await;
    pb.finish_and_clear();

    let job = match result {
        Ok(job) => job,
        Err(ClientError::Cancelled) => anyhow::bail!("Cancelled"),
        Err(e @ ClientError::Timeout { .. }) => {
            anyhow::bail!("{}. The job may still finish; try again with a longer --max-wait.", e)
        }
        Err(e) => return Err(e.into()),
    };

    let output = format_result(job.payload.as_str(), args.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use invp_core::MaxWait;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("a.pdf")));
        assert!(is_supported(Path::new("b.JPG")));
        assert!(is_supported(Path::new("c.tif")));
        assert!(!is_supported(Path::new("d.docx")));
        assert!(!is_supported(Path::new("noext")));
    }

    #[test]
    fn test_format_result() {
        let json = r#"{"a":1,"b":[true]}"#;
        assert_eq!(format_result(json, false).unwrap(), json);
        assert_eq!(
            format_result(json, true).unwrap(),
            "{\n  \"a\": 1,\n  \"b\": [\n    true\n  ]\n}"
        );
    }

    #[test]
    fn test_build_service_applies_overrides() {
        let settings = Settings {
            api_key: Some("key".to_string()),
            ..Settings::default()
        };

        let service = build_service(
            &settings,
            WaitArgs { interval: Some(1), max_wait: Some(10), wait_forever: false },
        )
        .unwrap();
        assert_eq!(service.config().polling_interval(), Duration::from_secs(1));
        assert_eq!(service.config().max_wait(), MaxWait::Limited(Duration::from_secs(10)));

        let service = build_service(
            &settings,
            WaitArgs { interval: None, max_wait: None, wait_forever: true },
        )
        .unwrap();
        assert_eq!(service.config().max_wait(), MaxWait::Unbounded);
        assert_eq!(service.config().polling_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_build_service_requires_key() {
        let result = build_service(
            &Settings::default(),
            WaitArgs { interval: None, max_wait: None, wait_forever: false },
        );
        match result {
            Ok(_) => panic!("expected a missing key to be rejected"),
            Err(err) => assert!(err.to_string().contains("API key")),
        }
    }
}
