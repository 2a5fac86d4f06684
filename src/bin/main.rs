// src/bin/main.rs

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quiz_race::cli::Cli;
use quiz_race::{ConsoleSink, EventSink, JsonLinesSink, QuizConfig, RoundSupervisor};

/// `RUST_LOG` wins when set and parseable; otherwise `--verbose` picks the level.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    match rust_log.map(str::trim).filter(|directives| !directives.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("Ignoring invalid RUST_LOG ({}), using {}", e, fallback);
            EnvFilter::new(fallback)
        }),
        None => EnvFilter::new(fallback),
    }
}

fn setup_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    // stdout is reserved for event rendering
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(rust_log.as_deref(), verbose))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    setup_logging(cli.verbose);

    let mut config = QuizConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli);
    config.validate().context("Configuration validation failed")?;

    let sink: Arc<dyn EventSink> = if cli.json {
        Arc::new(JsonLinesSink)
    } else {
        Arc::new(ConsoleSink::new())
    };

    let supervisor = RoundSupervisor::new(config, sink).context("Failed to build supervisor")?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, finishing up"),
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
        let _ = shutdown_tx.send(()).await;
    });

    let stats = supervisor.run(shutdown_rx).await.context("Supervisor failed")?;

    eprintln!();
    eprintln!("Rounds: {} (won {}, exhausted {})", stats.rounds, stats.won, stats.exhausted);
    for (worker, wins) in &stats.wins_by_worker {
        eprintln!("  Student {}: {} wins", worker, wins);
    }
    Ok(())
}
