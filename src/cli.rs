//! CLI argument parsing using clap

use clap::Parser;
use std::path::PathBuf;

/// quiz_race - workers race to answer arithmetic problems, round after round
#[derive(Parser, Debug)]
#[command(name = "quiz_race")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of workers (students)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Wrong answers tolerated before a round is exhausted
    #[arg(short = 'b', long)]
    pub wrong_budget: Option<u32>,

    /// Probability that a worker answers wrong (0.0 - 1.0)
    #[arg(short = 'p', long)]
    pub wrong_probability: Option<f64>,

    /// Minimum think time in milliseconds
    #[arg(long)]
    pub think_min_ms: Option<u64>,

    /// Maximum think time in milliseconds
    #[arg(long)]
    pub think_max_ms: Option<u64>,

    /// Pause between rounds in milliseconds
    #[arg(long)]
    pub pause_ms: Option<u64>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many rounds (default: run until Ctrl-C)
    #[arg(short = 'n', long)]
    pub rounds: Option<u64>,

    /// Emit events as JSON lines instead of classroom text
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
