use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{info, Level};

use globethrottle::config::ThrottleConfig;
use globethrottle::hammer::Hammer;
use globethrottle::ratelimit::GlobalThrottler;

/// Stress a cluster of throttling nodes with synthetic events.
#[derive(Debug, Parser)]
#[command(
    name = "globethrottle",
    version,
    about = "Approximate global rate limiting over UDP broadcast"
)]
struct Args {
    /// Maximum rate of events to allow per key per second
    #[arg(short, long, default_value_t = 2)]
    max_rate: u32,

    /// Rate at which to hammer the throttler, in events per second
    #[arg(short = 'r', long, default_value_t = 1)]
    hammer_rate: u32,

    /// Number of distinct keys to spread events over (1 = always key 0)
    #[arg(short, long, default_value_t = 1)]
    keys: u64,

    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting Globethrottle");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => ThrottleConfig::from_file(path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => ThrottleConfig::default(),
    };
    config.limits.max_rate = args.max_rate;

    info!(
        node_id = %config.exchange.node_id,
        port = config.exchange.port,
        max_rate = config.limits.max_rate,
        grace_period_ms = config.limits.grace_period_ms,
        "Configuration loaded"
    );

    let throttler = Arc::new(
        GlobalThrottler::start(&config)
            .await
            .context("starting global throttler")?,
    );

    let hammer = Hammer::new(Arc::clone(&throttler), args.hammer_rate, args.keys);

    // Run until the hammer finishes (rate 0) or a shutdown signal arrives.
    tokio::select! {
        _ = hammer.run() => {}
        _ = shutdown_signal() => {}
    }

    throttler.shutdown().await;
    info!("Globethrottle stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
