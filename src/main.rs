//! CLI entry point for the fetcher tool.

use anyhow::{Context, Result};
use clap::Parser;
use fetcher_core::{ClientConfig, DownloadRequest, Downloader, LocalStorage};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the JSON result; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let defaults = ClientConfig::default();
    let config = ClientConfig {
        connect_timeout_secs: args.connect_timeout.unwrap_or(defaults.connect_timeout_secs),
        read_timeout_secs: args.timeout.unwrap_or(defaults.read_timeout_secs),
        ..defaults
    };
    config.validate()?;

    let downloader =
        Downloader::with_config(&config).context("failed to build HTTP client")?;
    let storage = LocalStorage::new(&args.output_dir);

    let request = args.headers.iter().fold(
        DownloadRequest::new(args.uri.as_str())
            .with_fail_on_empty_response(!args.allow_empty)
            .with_allow_failed(args.allow_failed),
        |request, (name, value)| request.with_header(name.as_str(), value.as_str()),
    );

    info!(uri = %args.uri, output_dir = %args.output_dir.display(), "Fetcher starting");
    let result = downloader
        .download(&request, &storage)
        .await
        .with_context(|| format!("failed to download {}", args.uri))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
