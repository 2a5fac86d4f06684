use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

use crate::problem::Problem;
use crate::RoundId;

pub const DEFAULT_WRONG_ANSWER_MAX: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub String);

impl WorkerId {
    /// Classroom naming: `A`..`Z`, then `worker-27`, `worker-28`, ...
    pub fn for_index(index: usize) -> Self {
        if index < 26 {
            WorkerId(((b'A' + index as u8) as char).to_string())
        } else {
            WorkerId(format!("worker-{}", index + 1))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        WorkerId(s.to_string())
    }
}

/// A worker's single answer for one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub worker_id: WorkerId,
    pub value: f64,
    pub is_correct: bool,
    pub round_id: RoundId,
}

/// Inclusive think-time range in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThinkTime {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl ThinkTime {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    fn sample(&self, rng: &mut impl Rng) -> Duration {
        let hi = self.max_ms.max(self.min_ms);
        Duration::from_millis(rng.gen_range(self.min_ms..=hi))
    }
}

/// How a worker behaves. Shared by every member of a pool.
#[derive(Clone, Copy, Debug)]
pub struct Temperament {
    pub wrong_probability: f64,
    pub wrong_answer_max: u32,
    pub think_time: ThinkTime,
}

/// An independent responder. Identity is stable across rounds; there is no
/// mutable state, everything a response needs lives in `respond`.
#[derive(Clone, Debug)]
pub struct Worker {
    id: WorkerId,
    temperament: Temperament,
}

impl Worker {
    pub fn new(id: WorkerId, temperament: Temperament) -> Self {
        Self { id, temperament }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Produce exactly one response after a bounded, randomized think time.
    pub async fn respond<R: Rng + Send>(
        &self,
        problem: &Problem,
        round_id: RoundId,
        rng: &mut R,
    ) -> Response {
        let wrong = rng.gen_bool(self.temperament.wrong_probability.clamp(0.0, 1.0));
        let value = if wrong {
            rng.gen_range(0..=self.temperament.wrong_answer_max) as f64
        } else {
            problem.correct_answer
        };
        let think = self.temperament.think_time.sample(rng);

        sleep(think).await;

        Response {
            worker_id: self.id.clone(),
            value,
            is_correct: !wrong,
            round_id,
        }
    }
}
