//! anifetch HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;

use anifetch_server::{http, AppState, Config};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// anifetch acquisition server.
#[derive(Parser, Debug)]
#[command(name = "anifetch-server", about = "anifetch acquisition server")]
struct Args {
    /// HTTP server address
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Interpreter that runs the scraper scripts
    #[arg(long)]
    python: Option<String>,

    /// Directory holding the scraper scripts
    #[arg(long, default_value = "scripts")]
    scripts_dir: PathBuf,

    /// Acquisition timeout in milliseconds
    #[arg(long, default_value = "15000")]
    timeout_ms: u64,

    /// Maximum concurrent scraper processes
    #[arg(long, default_value = "4")]
    max_concurrent: usize,

    /// Directory snapshots are written to
    #[arg(long, default_value = "data")]
    snapshot_dir: PathBuf,

    /// Crawler service URL; replaces the local scripts when set
    #[arg(long)]
    crawler_url: Option<String>,

    /// Serve seed data unless a request sets `real=true`
    #[arg(long)]
    seed_only: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            bind_addr: self.bind,
            program: self.python.unwrap_or(defaults.program),
            scripts_dir: self.scripts_dir,
            timeout_ms: self.timeout_ms,
            max_concurrent_scrapes: self.max_concurrent,
            snapshot_dir: self.snapshot_dir,
            live_by_default: !self.seed_only,
            crawler_service_url: self.crawler_url,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("anifetch=info".parse()?))
        .init();

    let config = args.into_config();
    let addr: SocketAddr = config.bind_addr.parse()?;

    info!(
        addr = %addr,
        timeout_ms = config.timeout_ms,
        snapshot_dir = %config.snapshot_dir.display(),
        live_by_default = config.live_by_default,
        "Starting anifetch server"
    );

    let state = AppState::new(config);
    let router = http::create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
