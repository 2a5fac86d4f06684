//! Round supervisor
//!
//! Drives rounds one at a time:
//! `Idle -> Announcing -> AwaitingResponses -> Resolved -> Pausing -> Announcing ...`
//!
//! A new problem is only dispatched after the previous round was arbitrated,
//! so there is never more than one live problem.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::arbiter::{ArbiterStats, RaceArbiter};
use crate::config::QuizConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::events::{EventSink, RoundEvent};
use crate::mailbox;
use crate::pool::WorkerPool;
use crate::problem::{Problem, ProblemGenerator};
use crate::round::Outcome;
use crate::worker::WorkerId;
use crate::RoundId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Announcing,
    AwaitingResponses,
    Resolved,
    Pausing,
}

#[derive(Clone, Debug)]
pub struct RoundReport {
    pub round_id: RoundId,
    pub problem: Arc<Problem>,
    pub outcome: Outcome,
    /// Responses drained right after the round resolved
    pub drained: usize,
}

#[derive(Clone, Debug, Default)]
pub struct SupervisorStats {
    pub rounds: u64,
    pub won: u64,
    pub exhausted: u64,
    pub late_responses: u64,
    pub wins_by_worker: BTreeMap<WorkerId, u64>,
}

impl SupervisorStats {
    fn record(&mut self, report: &RoundReport) {
        self.rounds += 1;
        match &report.outcome {
            Outcome::Won(worker) => {
                self.won += 1;
                *self.wins_by_worker.entry(worker.clone()).or_default() += 1;
            }
            Outcome::Exhausted(_) => self.exhausted += 1,
            Outcome::Pending => {}
        }
    }
}

pub struct RoundSupervisor {
    config: QuizConfig,
    dispatcher: Dispatcher,
    arbiter: RaceArbiter,
    sink: Arc<dyn EventSink>,
    state: SupervisorState,
}

impl RoundSupervisor {
    /// Wire generator, pool, mailbox and arbiter from a validated config.
    pub fn new(config: QuizConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        let generator = ProblemGenerator::new(rng.clone(), config.operand_max);
        rng.jump();

        let capacity = mailbox::capacity(
            config.worker_count,
            config.think_time().max(),
            config.inter_round_pause(),
        );
        let (tx, rx) = mailbox::channel(capacity);
        let pool = WorkerPool::new(config.worker_ids(), config.temperament(), &mut rng, tx);

        info!(
            workers = config.worker_count,
            wrong_budget = config.wrong_budget,
            wrong_probability = config.wrong_probability,
            mailbox_capacity = capacity,
            "supervisor ready"
        );

        Ok(Self {
            arbiter: RaceArbiter::new(rx, Arc::clone(&sink)),
            dispatcher: Dispatcher::new(generator, pool),
            config,
            sink,
            state: SupervisorState::Idle,
        })
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn arbiter_stats(&self) -> ArbiterStats {
        self.arbiter.stats()
    }

    pub fn pool(&self) -> &WorkerPool {
        self.dispatcher.pool()
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    /// One full round, without the trailing pause.
    pub async fn run_round(&mut self) -> Result<RoundReport> {
        self.transition(SupervisorState::Announcing);
        let mut round = self.dispatcher.next_round(self.config.wrong_budget);
        info!(round_id = round.id, problem = %round.problem.text, "round started");
        self.sink.emit(&RoundEvent::RoundStarted {
            round_id: round.id,
            problem_text: round.problem.text.clone(),
        });
        let responders = self.dispatcher.broadcast(&round);

        self.transition(SupervisorState::AwaitingResponses);
        let outcome = self
            .arbiter
            .arbitrate(round.id, responders, round.wrong_budget)
            .await?;
        round.conclude(outcome.clone())?;

        self.transition(SupervisorState::Resolved);
        let canonical_answer = round.problem.correct_answer;
        match &outcome {
            Outcome::Won(worker_id) => self.sink.emit(&RoundEvent::RoundWon {
                round_id: round.id,
                worker_id: worker_id.clone(),
                canonical_answer,
            }),
            Outcome::Exhausted(reason) => self.sink.emit(&RoundEvent::RoundExhausted {
                round_id: round.id,
                canonical_answer,
                reason: *reason,
            }),
            Outcome::Pending => {}
        }
        let drained = self.arbiter.drain();

        Ok(RoundReport {
            round_id: round.id,
            problem: round.problem,
            outcome,
            drained,
        })
    }

    /// Run rounds until `shutdown` fires (or is dropped) or `max_rounds` complete.
    pub async fn run(mut self, mut shutdown: mpsc::Receiver<()>) -> Result<SupervisorStats> {
        let mut stats = SupervisorStats::default();
        let pause = self.config.inter_round_pause();

        loop {
            let report = select! {
                report = self.run_round() => report?,
                _ = shutdown.recv() => break,
            };
            stats.record(&report);

            if self.config.max_rounds.is_some_and(|max| stats.rounds >= max) {
                break;
            }

            self.transition(SupervisorState::Pausing);
            self.sink.emit(&RoundEvent::WarmingUp {
                round_id: self.dispatcher.upcoming_round_id(),
            });
            select! {
                _ = sleep(pause) => {}
                _ = shutdown.recv() => break,
            }
        }

        self.dispatcher.pool_mut().shutdown().await;
        self.arbiter.drain();
        stats.late_responses = self.arbiter.stats().late_drained + self.arbiter.stats().stale_discarded;
        self.transition(SupervisorState::Idle);

        info!(
            rounds = stats.rounds,
            won = stats.won,
            exhausted = stats.exhausted,
            late_responses = stats.late_responses,
            "supervisor stopped"
        );
        Ok(stats)
    }
}
