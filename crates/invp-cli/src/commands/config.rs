//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use tracing::debug;

use invp_core::Settings;

/// Environment variable overriding `api_key`.
pub const ENV_API_KEY: &str = "INVP_API_KEY";
/// Environment variable overriding `base_url`.
pub const ENV_BASE_URL: &str = "INVP_BASE_URL";
/// Environment variable overriding `api_job_status_polling_interval`.
pub const ENV_POLLING_INTERVAL: &str = "INVP_POLLING_INTERVAL";
/// Environment variable overriding `api_job_status_polling_wait`.
pub const ENV_POLLING_WAIT: &str = "INVP_POLLING_WAIT";

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "api_job_status_polling_wait")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// API key to store in the new file
    #[arg(long)]
    api_key: Option<String>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path.map(PathBuf::from).unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show_config(&path),
        ConfigCommand::Init(init_args) => init_config(init_args, config_path),
        ConfigCommand::Get { key } => get_config(&path, &key),
        ConfigCommand::Set { key, value } => set_config(&path, &key, &value),
        ConfigCommand::Path => show_path(&path),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invp")
        .join("config.json")
}

/// Load settings from the given file (or the default location if it exists)
/// and apply environment overrides on top.
pub fn load_settings(config_path: Option<&str>) -> anyhow::Result<Settings> {
    let settings = match config_path {
        Some(path) => Settings::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Loading config from {}", path.display());
                Settings::from_file(&path)?
            } else {
                Settings::default()
            }
        }
    };

    apply_env_overrides(settings, |name| std::env::var(name).ok())
}

/// Apply `INVP_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    mut settings: Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    if let Some(key) = lookup(ENV_API_KEY) {
        settings.api_key = Some(key);
    }
    if let Some(url) = lookup(ENV_BASE_URL) {
        settings.base_url = url;
    }
    if let Some(value) = lookup(ENV_POLLING_INTERVAL) {
        settings.api_job_status_polling_interval = parse_seconds(ENV_POLLING_INTERVAL, &value)?;
    }
    if let Some(value) = lookup(ENV_POLLING_WAIT) {
        settings.api_job_status_polling_wait = parse_seconds(ENV_POLLING_WAIT, &value)?;
    }
    Ok(settings)
}

fn parse_seconds(name: &str, value: &str) -> anyhow::Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds, got {:?}", name, value))
}

/// Settings as JSON with the API key masked.
fn masked_json(settings: &Settings) -> anyhow::Result<serde_json::Value> {
    let mut json = serde_json::to_value(settings)?;
    if let Some(key) = json.get_mut("api_key").filter(|v| v.is_string()) {
        *key = serde_json::Value::String("***".to_string());
    }
    Ok(json)
}

fn read_or_default(path: &Path) -> anyhow::Result<Settings> {
    if path.exists() {
        Ok(Settings::from_file(path)?)
    } else {
        Ok(Settings::default())
    }
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }

    let settings = read_or_default(path)?;
    println!("{}", serde_json::to_string_pretty(&masked_json(&settings)?)?);

    Ok(())
}

fn init_config(args: InitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let output_path = args
        .output
        .or_else(|| config_path.map(PathBuf::from))
        .unwrap_or_else(default_config_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let settings = Settings {
        api_key: args.api_key,
        ..Settings::default()
    };
    settings.save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(path: &Path, key: &str) -> anyhow::Result<()> {
    let settings = read_or_default(path)?;
    let json = masked_json(&settings)?;

    let value = json
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

fn set_config(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let settings = if path.exists() {
        Settings::from_file(path)?
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Settings::default()
    };

    let mut json = serde_json::to_value(&settings)?;
    let obj = json
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Settings are not a JSON object"))?;

    if !obj.contains_key(key) {
        anyhow::bail!("Configuration key not found: {}", key);
    }

    // String-typed keys (api_key, base_url) take the raw text, even if it looks numeric.
    let parsed_value = match obj.get(key) {
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) => {
            serde_json::Value::String(value.to_string())
        }
        _ => serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string())),
    };
    obj.insert(key.to_string(), parsed_value.clone());

    let settings: Settings = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    settings.save(path)?;

    let shown = if key == "api_key" {
        "\"***\"".to_string()
    } else {
        serde_json::to_string(&parsed_value)?
    };
    println!("{} Set {} = {}", style("✓").green(), key, shown);

    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'invp config init' to create a configuration file.");
    }

    Ok(())
}
