//! Quiz configuration
//!
//! Values come from an optional TOML file, then command-line overrides, then
//! `validate()`. Every field has a default matching the classic classroom:
//! five students, a 30% chance of being wrong, 1-3s of thinking and a 3s
//! warm-up between questions.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::cli::Cli;
use crate::error::{QuizError, Result};
use crate::mailbox;
use crate::problem::{DEFAULT_OPERAND_MAX, OPERAND_LIMIT};
use crate::worker::{Temperament, ThinkTime, WorkerId, DEFAULT_WRONG_ANSWER_MAX};

/// Ten minutes of thinking is already far beyond a classroom.
pub const THINK_TIME_LIMIT_MS: u64 = 600_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_wrong_budget")]
    pub wrong_budget: u32,

    #[serde(default = "default_wrong_probability")]
    pub wrong_probability: f64,

    #[serde(default = "default_think_time_min_ms")]
    pub think_time_min_ms: u64,

    #[serde(default = "default_think_time_max_ms")]
    pub think_time_max_ms: u64,

    /// Warm-up between two rounds
    #[serde(default = "default_inter_round_pause_ms")]
    pub inter_round_pause_ms: u64,

    #[serde(default = "default_operand_max")]
    pub operand_max: i64,

    #[serde(default = "default_wrong_answer_max")]
    pub wrong_answer_max: u32,

    /// RNG seed; `None` seeds from entropy
    #[serde(default)]
    pub seed: Option<u64>,

    /// Stop after this many rounds; `None` runs until shutdown
    #[serde(default)]
    pub max_rounds: Option<u64>,
}

fn default_worker_count() -> usize {
    5
}

fn default_wrong_budget() -> u32 {
    5
}

fn default_wrong_probability() -> f64 {
    0.3
}

fn default_think_time_min_ms() -> u64 {
    1000
}

fn default_think_time_max_ms() -> u64 {
    3000
}

fn default_inter_round_pause_ms() -> u64 {
    3000
}

fn default_operand_max() -> i64 {
    DEFAULT_OPERAND_MAX
}

fn default_wrong_answer_max() -> u32 {
    DEFAULT_WRONG_ANSWER_MAX
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            wrong_budget: default_wrong_budget(),
            wrong_probability: default_wrong_probability(),
            think_time_min_ms: default_think_time_min_ms(),
            think_time_max_ms: default_think_time_max_ms(),
            inter_round_pause_ms: default_inter_round_pause_ms(),
            operand_max: default_operand_max(),
            wrong_answer_max: default_wrong_answer_max(),
            seed: None,
            max_rounds: None,
        }
    }
}

impl QuizConfig {
    /// Load from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                let contents = fs::read_to_string(path)?;
                Self::from_toml_str(&contents)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(::toml::from_str(contents)?)
    }

    /// Command-line values take precedence over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(workers) = cli.workers {
            self.worker_count = workers;
        }
        if let Some(budget) = cli.wrong_budget {
            self.wrong_budget = budget;
        }
        if let Some(p) = cli.wrong_probability {
            self.wrong_probability = p;
        }
        if let Some(min) = cli.think_min_ms {
            self.think_time_min_ms = min;
        }
        if let Some(max) = cli.think_max_ms {
            self.think_time_max_ms = max;
        }
        if let Some(pause) = cli.pause_ms {
            self.inter_round_pause_ms = pause;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if cli.rounds.is_some() {
            self.max_rounds = cli.rounds;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(QuizError::Config("worker_count must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.wrong_probability) {
            return Err(QuizError::Config(format!(
                "wrong_probability must be within [0, 1], got {}",
                self.wrong_probability
            )));
        }
        if self.think_time_min_ms > self.think_time_max_ms {
            return Err(QuizError::Config(format!(
                "think_time_min_ms ({}) exceeds think_time_max_ms ({})",
                self.think_time_min_ms, self.think_time_max_ms
            )));
        }
        if self.think_time_max_ms > THINK_TIME_LIMIT_MS {
            return Err(QuizError::Config(format!(
                "think_time_max_ms must be at most {}, got {}",
                THINK_TIME_LIMIT_MS, self.think_time_max_ms
            )));
        }
        let capacity = mailbox::capacity(
            self.worker_count,
            self.think_time().max(),
            self.inter_round_pause(),
        );
        if capacity > mailbox::MAX_CAPACITY {
            return Err(QuizError::Config(format!(
                "mailbox would need {} slots, more than the {} allowed; lower worker_count or think_time_max_ms, or raise inter_round_pause_ms",
                capacity,
                mailbox::MAX_CAPACITY
            )));
        }
        if !(0..=OPERAND_LIMIT).contains(&self.operand_max) {
            return Err(QuizError::Config(format!(
                "operand_max must be between 0 and {}, got {}",
                OPERAND_LIMIT, self.operand_max
            )));
        }
        if self.max_rounds == Some(0) {
            return Err(QuizError::Config("max_rounds must be at least 1 when set".to_string()));
        }
        Ok(())
    }

    pub fn think_time(&self) -> ThinkTime {
        ThinkTime::new(self.think_time_min_ms, self.think_time_max_ms)
    }

    pub fn inter_round_pause(&self) -> Duration {
        Duration::from_millis(self.inter_round_pause_ms)
    }

    pub fn temperament(&self) -> Temperament {
        Temperament {
            wrong_probability: self.wrong_probability,
            wrong_answer_max: self.wrong_answer_max,
            think_time: self.think_time(),
        }
    }

    pub fn worker_ids(&self) -> Vec<WorkerId> {
        (0..self.worker_count).map(WorkerId::for_index).collect()
    }
}
