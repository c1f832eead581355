//! Moncensus - Monitor inventory agent
//!
//! Reconciles captured display data for each configured host and writes
//! the monitor inventory as attribute rows or JSON.

mod collect;
mod config;
mod rows;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::collect::{collect_hosts, CollectSettings};
use crate::config::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "moncensus")]
#[command(about = "Monitor inventory from EDID and device enumeration captures")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "moncensus.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Output format (overrides the configuration)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Only collect the named host (repeatable)
    #[arg(long = "host")]
    hosts: Vec<String>,

    /// Task id written into attribute rows
    #[arg(long, default_value = "0")]
    task_id: String,

    /// Write a default configuration file and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Moncensus v{}", env!("CARGO_PKG_VERSION"));

    if args.init {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Default configuration written");
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if let Some(format) = args.format {
        config.output.format = format;
    }

    // Capture paths are relative to the configuration file
    let base = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let hosts: Vec<_> = config
        .selected_hosts(&args.hosts)
        .into_iter()
        .map(|host| host.resolved(base))
        .collect();
    if hosts.is_empty() {
        warn!("No hosts selected");
    }

    let settings = Arc::new(CollectSettings::from_config(&config));
    info!(
        hosts = hosts.len(),
        class = %settings.catalog.display_class,
        reference_year = settings.decoder.reference_year(),
        "Starting collection"
    );

    let reports = collect_hosts(hosts, settings).await;
    let text = rows::render(&reports, &config.output, &args.task_id)?;

    match &config.output.path {
        Some(path) => {
            let path = base.join(path);
            std::fs::write(&path, text)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), reports = reports.len(), "Inventory written");
        }
        None => print!("{}", text),
    }

    Ok(())
}
