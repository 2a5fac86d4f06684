use std::sync::Arc;

use crate::pool::WorkerPool;
use crate::problem::ProblemGenerator;
use crate::round::Round;
use crate::RoundId;

/// Composes the generator and the pool: produces the next round and broadcasts it.
pub struct Dispatcher {
    generator: ProblemGenerator,
    pool: WorkerPool,
    last_round_id: RoundId,
}

impl Dispatcher {
    pub fn new(generator: ProblemGenerator, pool: WorkerPool) -> Self {
        Self {
            generator,
            pool,
            last_round_id: 0,
        }
    }

    /// Generate a problem and assign the next round id. Ids start at 1.
    pub fn next_round(&mut self, wrong_budget: u32) -> Round {
        self.last_round_id += 1;
        Round::new(self.last_round_id, Arc::new(self.generator.generate()), wrong_budget)
    }

    /// Id the next call to `next_round` will assign.
    pub fn upcoming_round_id(&self) -> RoundId {
        self.last_round_id + 1
    }

    pub fn broadcast(&mut self, round: &Round) -> usize {
        self.pool.broadcast(Arc::clone(&round.problem), round.id)
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut WorkerPool {
        &mut self.pool
    }
}
