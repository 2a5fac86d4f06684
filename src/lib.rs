//! quiz_race - a round-based race coordinator
//!
//! A supervisor broadcasts an arithmetic problem to a fixed pool of workers,
//! each worker answers once after a random think time, and an arbiter consumes
//! the answers in arrival order: the first correct one wins the round, too many
//! wrong ones exhaust it. Then the next round starts.
//!
//! - [`problem`] - problems and their seeded generator
//! - [`worker`], [`pool`] - responders and the fixed pool that spawns them
//! - [`mailbox`] - the bounded channel every worker sends into
//! - [`dispatcher`] - next round id + broadcast
//! - [`arbiter`] - win / exhaust decision and draining of late answers
//! - [`supervisor`] - the infinite round loop
//! - [`events`] - what the coordinator reports to the outside

pub mod arbiter;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod mailbox;
pub mod pool;
pub mod problem;
pub mod round;
pub mod supervisor;
pub mod worker;

// Core types
pub type RoundId = u64;

pub use arbiter::{ArbiterStats, RaceArbiter};
pub use config::QuizConfig;
pub use error::{QuizError, Result};
pub use events::{ChannelSink, ConsoleSink, EventSink, JsonLinesSink, RoundEvent};
pub use problem::{Operator, Problem, ProblemGenerator};
pub use round::{ExhaustReason, Outcome, Round};
pub use supervisor::{RoundReport, RoundSupervisor, SupervisorState, SupervisorStats};
pub use worker::{Response, WorkerId};
