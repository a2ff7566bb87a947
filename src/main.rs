//! eventmeter - a minimal HTTP event API with built-in metrics
//!
//! Usage:
//!     eventmeter [--config <path>]
//!
//! See --help for more options.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

use eventmeter::config::{Config, load_config, validate_config};
use eventmeter::server::ApiServer;
use eventmeter::state::AppState;
use eventmeter::util::{ShutdownSignal, init_logging};

/// A minimal HTTP event API with request counters and latency histograms.
#[derive(Parser, Debug)]
#[command(name = "eventmeter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => load_config(path).with_context(|| {
            format!("failed to load configuration from '{}'", path.display())
        })?,
        None => Config::default(),
    };

    // CLI overrides config
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if let Some(level) = cli.log_level {
        config.global.log_level = level;
    }
    validate_config(&config)
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    // Initialize logging
    init_logging(&config.global.log_level, &config.global.log_format);

    // If --validate flag, just validate and exit
    if cli.validate {
        info!("Configuration is valid");
        println!("Configuration is valid.");
        println!("  Listen: {}", config.server.listen);
        println!("  Event delay: {}", humantime::format_duration(config.server.event_delay));
        if config.metrics.enabled {
            println!("  Metrics: {}", config.metrics.path);
        } else {
            println!("  Metrics: disabled");
        }
        return Ok(());
    }

    info!(
        config_path = ?cli.config,
        listen = %config.server.listen,
        "eventmeter starting"
    );

    run(config)
}

/// Run the server with the given configuration.
fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(config).await })
}

/// Async entry point.
async fn run_async(config: Config) -> Result<()> {
    let shutdown = ShutdownSignal::new();
    let listen = config.server.listen;

    let state = AppState::new(config).context("failed to register request metrics")?;

    let server = ApiServer::bind(state)
        .await
        .with_context(|| format!("failed to bind api server on {}", listen))?;

    let handle = tokio::spawn(server.run(shutdown.subscribe()));

    info!("eventmeter is running");
    info!("press Ctrl+C to stop");

    // Wait for shutdown signal
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("received shutdown signal");
        }
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
        }
    }

    shutdown.shutdown();
    let _ = handle.await;

    info!("eventmeter shut down complete");
    Ok(())
}
