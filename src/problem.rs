//! Arithmetic problems and their generator.
//!
//! Every problem carries one canonical answer. Evaluation is total: division by
//! zero answers `0` instead of failing.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_OPERAND_MAX: i64 = 100;

/// Largest operand a generator will draw.
pub const OPERAND_LIMIT: i64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Evaluate `lhs op rhs`. Total over every `i64` pair: integer operations run
/// in `i128`, a zero divisor yields `0.0`.
pub fn evaluate(lhs: i64, op: Operator, rhs: i64) -> f64 {
    let (a, b) = (lhs as i128, rhs as i128);
    match op {
        Operator::Add => (a + b) as f64,
        Operator::Sub => (a - b) as f64,
        Operator::Mul => (a * b) as f64,
        Operator::Div => {
            if rhs == 0 {
                0.0
            } else {
                lhs as f64 / rhs as f64
            }
        }
    }
}

/// One unit of work broadcast to every worker of a round. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub text: String,
    pub correct_answer: f64,
    pub lhs: i64,
    pub op: Operator,
    pub rhs: i64,
}

impl Problem {
    pub fn new(lhs: i64, op: Operator, rhs: i64) -> Self {
        Self {
            text: format!("{} {} {}", lhs, op, rhs),
            correct_answer: evaluate(lhs, op, rhs),
            lhs,
            op,
            rhs,
        }
    }
}

pub struct ProblemGenerator {
    rng: Xoshiro256PlusPlus,
    operand_max: i64,
}

impl ProblemGenerator {
    pub fn new(rng: Xoshiro256PlusPlus, operand_max: i64) -> Self {
        Self {
            rng,
            operand_max: operand_max.clamp(0, OPERAND_LIMIT),
        }
    }

    /// Seeded generator, reproducible across runs.
    pub fn with_seed(seed: u64, operand_max: i64) -> Self {
        Self::new(Xoshiro256PlusPlus::seed_from_u64(seed), operand_max)
    }

    pub fn from_entropy(operand_max: i64) -> Self {
        Self::new(Xoshiro256PlusPlus::from_entropy(), operand_max)
    }

    pub fn generate(&mut self) -> Problem {
        let lhs = self.rng.gen_range(0..=self.operand_max);
        let rhs = self.rng.gen_range(0..=self.operand_max);
        let op = Operator::ALL[self.rng.gen_range(0..Operator::ALL.len())];
        Problem::new(lhs, op, rhs)
    }
}
