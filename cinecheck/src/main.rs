//! cinecheck - movie catalog reconciliation CLI
//!
//! Reads an exported catalog CSV, checks it for duplicate entries, then
//! reconciles every row against the metadata service: a title search per row,
//! plus a canonical-title verification for rows that already carry an
//! identifier. Diagnostics go to stdout in catalog order; a summary line
//! closes the report.

use anyhow::{Context, Result};
use cinecheck::services::{
    catalog_reader, AmbiguousPolicy, PipelineError, ReconciliationPipeline, TmdbClient,
};
use cinecheck_common::config::{load_toml_config, Config, ConfigOverrides};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "cinecheck",
    version,
    about = "Reconcile a movie catalog against a metadata service"
)]
struct Args {
    /// Catalog CSV file (title, year, identifier, further columns ignored)
    catalog: PathBuf,

    /// Metadata-service API key (overrides CINECHECK_API_KEY and config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Metadata-service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Preferred result language (e.g. en-US)
    #[arg(long)]
    language: Option<String>,

    /// Concurrent metadata lookups
    #[arg(long)]
    workers: Option<usize>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Config file path (default: platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sort match diagnostics by title instead of catalog order
    #[arg(long)]
    sorted: bool,

    /// How to report rows whose search returns several candidates
    #[arg(long, value_enum, default_value_t = AmbiguousArg::Report)]
    ambiguous: AmbiguousArg,
}

/// CLI surface for [`AmbiguousPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AmbiguousArg {
    /// List every candidate on one diagnostic line
    Report,
    /// Fold the row into the unresolved count
    Unresolved,
}

impl From<AmbiguousArg> for AmbiguousPolicy {
    fn from(arg: AmbiguousArg) -> Self {
        match arg {
            AmbiguousArg::Report => AmbiguousPolicy::Report,
            AmbiguousArg::Unresolved => AmbiguousPolicy::Unresolved,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting cinecheck {}", env!("CARGO_PKG_VERSION"));

    let toml_config = load_toml_config(args.config.as_deref())?;
    let overrides = ConfigOverrides {
        api_key: args.api_key.clone(),
        base_url: args.base_url.clone(),
        language: args.language.clone(),
        workers: args.workers,
        request_timeout_ms: args.timeout_ms,
    };
    let config = Config::resolve(overrides, &toml_config)?;

    let rows = catalog_reader::read_catalog(&args.catalog)?;

    let client = Arc::new(
        TmdbClient::new(&config).context("Failed to initialize metadata client")?,
    );

    let cancel_token = CancellationToken::new();
    {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling run");
                token.cancel();
            }
        });
    }

    let pipeline = ReconciliationPipeline::new(
        client,
        config.language.clone(),
        config.workers,
        args.ambiguous.into(),
        cancel_token,
    );

    match pipeline.run(rows).await {
        Ok(report) => {
            let mut match_lines = report.match_lines;
            if args.sorted {
                match_lines.sort_by(|a, b| {
                    a.title()
                        .unwrap_or("")
                        .cmp(b.title().unwrap_or(""))
                        .then(a.row().cmp(&b.row()))
                });
            }
            for line in &match_lines {
                println!("{}", line);
            }
            for line in &report.verify_lines {
                println!("{}", line);
            }
            println!("{}", report.summary);
            Ok(())
        }
        Err(PipelineError::Duplicates(duplicates)) => {
            let lines = duplicates.diagnostics();
            for line in &lines {
                eprintln!("{}", line);
            }
            anyhow::bail!("duplicate catalog entries detected ({} found)", lines.len());
        }
        Err(e @ PipelineError::Cancelled) => Err(e.into()),
    }
}
