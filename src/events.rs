//! Observability boundary.
//!
//! The coordinator reports what happens through `RoundEvent`s. Sinks render
//! them; nothing a sink does feeds back into a round. Sinks must tolerate
//! `ResponseObserved` events arriving after the round's outcome event, those
//! carry `late: true` and are informational only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::round::ExhaustReason;
use crate::worker::WorkerId;
use crate::RoundId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    /// Warm-up before announcing `round_id`; never emitted before the first round
    WarmingUp {
        round_id: RoundId,
    },
    RoundStarted {
        round_id: RoundId,
        problem_text: String,
    },
    ResponseObserved {
        round_id: RoundId,
        worker_id: WorkerId,
        value: f64,
        is_correct: bool,
        late: bool,
    },
    RoundWon {
        round_id: RoundId,
        worker_id: WorkerId,
        canonical_answer: f64,
    },
    RoundExhausted {
        round_id: RoundId,
        canonical_answer: f64,
        reason: ExhaustReason,
    },
}

impl RoundEvent {
    pub fn round_id(&self) -> RoundId {
        match self {
            RoundEvent::WarmingUp { round_id }
            | RoundEvent::RoundStarted { round_id, .. }
            | RoundEvent::ResponseObserved { round_id, .. }
            | RoundEvent::RoundWon { round_id, .. }
            | RoundEvent::RoundExhausted { round_id, .. } => *round_id,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RoundEvent);
}

/// Problem texts the console keeps around for answer lines.
const REMEMBERED_ROUNDS: usize = 16;

/// Classroom rendering on stdout.
///
/// Answers are printed next to their problem, so the sink remembers the text
/// of every `RoundStarted` for a few rounds.
#[derive(Default)]
pub struct ConsoleSink {
    problems: Mutex<BTreeMap<RoundId, String>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self, event: &RoundEvent) -> String {
        let mut problems = self.problems.lock().unwrap_or_else(|e| e.into_inner());
        match event {
            RoundEvent::WarmingUp { .. } => "Teacher: Guys, are you ready?".to_string(),
            RoundEvent::RoundStarted {
                round_id,
                problem_text,
            } => {
                problems.insert(*round_id, problem_text.clone());
                while problems.len() > REMEMBERED_ROUNDS {
                    problems.pop_first();
                }
                format!("Teacher: {} = ?", problem_text)
            }
            RoundEvent::ResponseObserved {
                round_id,
                worker_id,
                value,
                is_correct,
                late: false,
            } => {
                let verdict = if *is_correct { "right" } else { "wrong" };
                format!(
                    "Student {}: {}{:.2}!\nTeacher: {}, you are {}!",
                    worker_id,
                    asked(&problems, *round_id),
                    value,
                    worker_id,
                    verdict
                )
            }
            RoundEvent::ResponseObserved {
                round_id,
                worker_id,
                value,
                late: true,
                ..
            } => {
                format!(
                    "  (late) Student {}: {}{:.2} for round {}",
                    worker_id,
                    asked(&problems, *round_id),
                    value,
                    round_id
                )
            }
            RoundEvent::RoundWon {
                worker_id,
                canonical_answer,
                ..
            } => {
                format!(
                    "Teacher: {} wins! Answer is {:.2}.",
                    worker_id, canonical_answer
                )
            }
            RoundEvent::RoundExhausted {
                canonical_answer, ..
            } => {
                format!("Teacher: Boooo~ Answer is {:.2}.", canonical_answer)
            }
        }
    }
}

/// `"12 + 5 = "` for a remembered round, empty otherwise.
fn asked(problems: &BTreeMap<RoundId, String>, round_id: RoundId) -> String {
    problems
        .get(&round_id)
        .map(|text| format!("{} = ", text))
        .unwrap_or_default()
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: &RoundEvent) {
        println!("{}", self.render(event));
    }
}

/// One JSON object per line on stdout.
#[derive(Default)]
pub struct JsonLinesSink;

impl EventSink for JsonLinesSink {
    fn emit(&self, event: &RoundEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "{}", line);
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
        }
    }
}

/// Forwards events to an external consumer.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RoundEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RoundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &RoundEvent) {
        // A consumer that went away is not the coordinator's problem.
        let _ = self.tx.send(event.clone());
    }
}
