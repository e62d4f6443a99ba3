//! anifetch CLI - one-shot acquisitions and snapshot inspection.

use std::collections::HashMap;
use std::path::PathBuf;

use anifetch_core::{TaskKind, DEFAULT_LIMIT};
use anifetch_server::http::responses::{
    AcquisitionResponse, SnapshotListResponse, SnapshotResponse, VideoPlayResponse,
};
use anifetch_server::{AppState, Config, ResolveOptions};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// anifetch CLI - run the acquisition pipeline from a terminal
#[derive(Parser, Debug)]
#[command(name = "anifetch")]
#[command(about = "Fetch anime listings through the acquisition pipeline", long_about = None)]
struct Cli {
    /// Interpreter that runs the scraper scripts
    #[arg(long, global = true)]
    python: Option<String>,

    /// Directory holding the scraper scripts
    #[arg(long, global = true, default_value = "scripts")]
    scripts_dir: PathBuf,

    /// Acquisition timeout in milliseconds
    #[arg(long, global = true, default_value = "15000")]
    timeout_ms: u64,

    /// Directory snapshots are read from and written to
    #[arg(long, global = true, default_value = "data")]
    snapshot_dir: PathBuf,

    /// Crawler service URL; replaces the local scripts when set
    #[arg(long, global = true)]
    crawler_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Acquire one listing and print it as JSON
    Fetch {
        /// latest, search, episodes or video
        kind: TaskKind,

        /// Search query, show id or episode page URL
        param: Option<String>,

        /// Maximum number of items
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write a snapshot of live results
        #[arg(long)]
        save: bool,

        /// Print seed data without running the scraper
        #[arg(long)]
        seed: bool,
    },

    /// Inspect saved snapshots
    #[command(subcommand)]
    Snapshots(SnapshotCommands),
}

#[derive(Subcommand, Debug)]
enum SnapshotCommands {
    /// List snapshots, newest first
    List,

    /// Print one snapshot
    Show {
        /// Snapshot file name
        name: String,
    },
}

impl Cli {
    fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            program: self.python.clone().unwrap_or(defaults.program),
            scripts_dir: self.scripts_dir.clone(),
            timeout_ms: self.timeout_ms,
            snapshot_dir: self.snapshot_dir.clone(),
            crawler_service_url: self.crawler_url.clone(),
            // One task per run
            max_concurrent_scrapes: 1,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("anifetch=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let state = AppState::new(cli.config());

    match cli.command {
        Commands::Fetch {
            kind,
            param,
            limit,
            save,
            seed,
        } => {
            let params = fetch_params(kind, param.as_deref(), limit);
            let task = state.normalizer.normalize(kind, &params)?;
            let options = ResolveOptions {
                live: !seed,
                persist: save,
            };
            let resolution = state.pipeline.resolve(&task, options).await;

            if kind == TaskKind::Video {
                let page_url = task.param("url").unwrap_or_default().to_string();
                print_json(&VideoPlayResponse::from_resolution(
                    resolution, &page_url, None, None,
                ))?;
            } else {
                print_json(&AcquisitionResponse::from(resolution))?;
            }
        }
        Commands::Snapshots(SnapshotCommands::List) => {
            let snapshots = state.snapshots().list().await?;
            print_json(&SnapshotListResponse {
                success: true,
                total_count: snapshots.len(),
                data: snapshots,
            })?;
        }
        Commands::Snapshots(SnapshotCommands::Show { name }) => {
            let snapshot = state.snapshots().read(&name).await?;
            print_json(&SnapshotResponse {
                success: true,
                name,
                snapshot,
            })?;
        }
    }

    Ok(())
}

/// Request parameters for a fetch; the positional value fills the kind's primary parameter.
fn fetch_params(kind: TaskKind, param: Option<&str>, limit: Option<usize>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(value) = param {
        params.insert(kind.primary_param().to_string(), value.to_string());
    }
    if let Some(limit) = limit {
        params.insert("limit".to_string(), limit.to_string());
    } else if !params.contains_key("limit") {
        params.insert("limit".to_string(), DEFAULT_LIMIT.to_string());
    }
    params
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
