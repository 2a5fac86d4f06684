use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{QuizError, Result};
use crate::problem::Problem;
use crate::worker::WorkerId;
use crate::RoundId;

/// Which exit condition exhausted a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustReason {
    /// The wrong counter reached the wrong budget.
    WrongBudget,
    /// Every expected responder answered, none correctly.
    AllResponded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Won(WorkerId),
    Exhausted(ExhaustReason),
}

impl Outcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending)
    }

    pub fn winner(&self) -> Option<&WorkerId> {
        match self {
            Outcome::Won(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Round {
    pub id: RoundId,
    pub problem: Arc<Problem>,
    pub wrong_budget: u32,
    outcome: Outcome,
}

impl Round {
    pub fn new(id: RoundId, problem: Arc<Problem>, wrong_budget: u32) -> Self {
        Self {
            id,
            problem,
            wrong_budget,
            outcome: Outcome::Pending,
        }
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Set the outcome. Allowed exactly once, and never back to `Pending`.
    pub fn conclude(&mut self, outcome: Outcome) -> Result<()> {
        if !self.outcome.is_pending() {
            return Err(QuizError::AlreadyResolved { round_id: self.id });
        }
        if outcome.is_pending() {
            return Err(QuizError::StillPending { round_id: self.id });
        }
        self.outcome = outcome;
        Ok(())
    }
}
