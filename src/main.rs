//! Dataset Uploadr - upload sessions for the dataset explorer backend
//!
//! Stages image files, uploads them one at a time and prints per-file
//! results as JSON.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dataset_uploadr::api::{Category, DatasetApi, HttpApiClient};
use dataset_uploadr::config::Config;
use dataset_uploadr::stats::StatsBoard;
use dataset_uploadr::upload::{FileCandidate, LoadError, SessionHandle, UploadDriver};
use dataset_uploadr::{metrics, telemetry};
use std::path::PathBuf;
use tracing::{info, warn};

/// Dataset Uploadr - stage and upload images for analysis
#[derive(Parser, Debug)]
#[command(name = "dataset-uploadr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive, overrides the configuration
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Print Prometheus metrics to stderr after the command finishes
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload image files to a category endpoint
    Upload {
        /// Target category (medical, xray, traffic)
        #[arg(short = 't', long)]
        category: Category,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show chest X-ray and Tiny-ImageNet statistics
    Stats,

    /// List available datasets
    Datasets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => Config::default(),
    };

    telemetry::init_subscriber(&config.logging, cli.log_level.as_deref())?;
    info!("Starting Dataset Uploadr v{}", dataset_uploadr::VERSION);

    let client = HttpApiClient::new(&config.api)?;

    let outcome = match cli.command {
        Command::Upload { category, files } => upload(&config, client, category, files).await,
        Command::Stats => stats(client).await,
        Command::Datasets => datasets(client).await,
    };

    if cli.metrics || config.metrics.enabled {
        eprint!("{}", metrics::gather_text());
    }

    outcome
}

async fn upload(
    config: &Config,
    client: HttpApiClient,
    category: Category,
    files: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let mut candidates = Vec::with_capacity(files.len());
    for path in &files {
        match FileCandidate::load(path, &config.upload).await {
            Ok(candidate) => candidates.push(candidate),
            Err(LoadError::Rejected(rejection)) => {
                warn!(path = ?path, reason = %rejection, "Skipping rejected file");
                metrics::record_staging_rejection(rejection.reason(), 1);
            }
            Err(LoadError::Io(e)) => warn!(path = ?path, error = %e, "Skipping unreadable file"),
        }
    }

    let session = SessionHandle::new(config.upload.clone());
    let outcome = session.stage(candidates);
    if outcome.staged.is_empty() {
        bail!("no files were staged for upload");
    }

    let driver = UploadDriver::new(client, category);
    let report = driver.run(&session).await?;
    info!(
        completed = report.completed,
        failed = report.failed,
        "Upload run finished"
    );

    let snapshot = session.snapshot();
    let summaries: Vec<_> = snapshot.iter().map(|entry| entry.summary()).collect();
    println!("{}", serde_json::to_string_pretty(&summaries)?);

    if !report.all_succeeded() {
        bail!("{} of {} uploads failed", report.failed, report.attempted);
    }
    Ok(())
}

async fn stats(client: HttpApiClient) -> anyhow::Result<()> {
    let mut board = StatsBoard::new(client);
    board.load().await;
    println!("{}", serde_json::to_string_pretty(&board.view())?);
    Ok(())
}

async fn datasets(client: HttpApiClient) -> anyhow::Result<()> {
    let datasets = client.datasets().await?;
    println!("{}", serde_json::to_string_pretty(&datasets)?);
    Ok(())
}
