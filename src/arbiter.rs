//! Race arbitration.
//!
//! The arbiter is the sole reader of the mailbox. It consumes responses in
//! arrival order and decides the current round: the first correct response
//! consumed wins, otherwise the round is exhausted once the wrong budget is
//! reached or every expected responder has answered.
//!
//! Responses tagged with an earlier round are drained: they are reported as
//! late and never count toward the current round. Responses tagged with a
//! round the arbiter has not seen yet break an invariant; they are logged and
//! dropped.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{QuizError, Result};
use crate::events::{EventSink, RoundEvent};
use crate::mailbox::MailboxReceiver;
use crate::round::{ExhaustReason, Outcome};
use crate::worker::Response;
use crate::RoundId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArbiterStats {
    /// Responses counted toward the round they were tagged with.
    pub consumed: u64,
    /// Responses from earlier rounds discarded while a later round was open.
    pub stale_discarded: u64,
    /// Responses of a concluded round picked up by `drain`.
    pub late_drained: u64,
    pub violations: u64,
}

enum Tag {
    Current,
    Stale,
    Invalid,
}

pub struct RaceArbiter {
    mailbox: MailboxReceiver,
    sink: Arc<dyn EventSink>,
    current_round: RoundId,
    stats: ArbiterStats,
}

impl RaceArbiter {
    pub fn new(mailbox: MailboxReceiver, sink: Arc<dyn EventSink>) -> Self {
        Self {
            mailbox,
            sink,
            current_round: 0,
            stats: ArbiterStats::default(),
        }
    }

    pub fn stats(&self) -> ArbiterStats {
        self.stats
    }

    pub fn current_round(&self) -> RoundId {
        self.current_round
    }

    /// Decide `round_id` from the mailbox. Never returns `Outcome::Pending`.
    pub async fn arbitrate(
        &mut self,
        round_id: RoundId,
        expected_responders: usize,
        wrong_budget: u32,
    ) -> Result<Outcome> {
        if expected_responders == 0 {
            return Err(QuizError::NoResponders { round_id });
        }
        self.current_round = round_id;

        let mut wrong: u32 = 0;
        let mut responses: usize = 0;

        loop {
            let response = self
                .mailbox
                .recv()
                .await
                .ok_or(QuizError::MailboxClosed { round_id })?;

            match self.classify(&response) {
                Tag::Current => {}
                Tag::Stale => {
                    self.stats.stale_discarded += 1;
                    debug!(
                        round_id,
                        stale_round = response.round_id,
                        worker = %response.worker_id,
                        "stale response drained"
                    );
                    self.observe(&response, true);
                    continue;
                }
                Tag::Invalid => {
                    self.reject(&response);
                    continue;
                }
            }

            self.stats.consumed += 1;
            self.observe(&response, false);

            if response.is_correct {
                info!(round_id, winner = %response.worker_id, "round won");
                return Ok(Outcome::Won(response.worker_id));
            }

            wrong += 1;
            responses += 1;
            debug!(round_id, worker = %response.worker_id, wrong, wrong_budget, "wrong answer");

            if wrong >= wrong_budget {
                info!(round_id, wrong, "wrong budget exhausted");
                return Ok(Outcome::Exhausted(ExhaustReason::WrongBudget));
            }
            if responses >= expected_responders {
                info!(round_id, responses, "every responder answered wrong");
                return Ok(Outcome::Exhausted(ExhaustReason::AllResponded));
            }
        }
    }

    /// Empty whatever is already in the mailbox without waiting.
    /// Returns the number of responses removed.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(response) = self.mailbox.try_recv() {
            drained += 1;
            match self.classify(&response) {
                Tag::Current => {
                    self.stats.late_drained += 1;
                    self.observe(&response, true);
                }
                Tag::Stale => {
                    self.stats.stale_discarded += 1;
                    self.observe(&response, true);
                }
                Tag::Invalid => self.reject(&response),
            }
        }
        if drained > 0 {
            debug!(round_id = self.current_round, drained, "mailbox drained");
        }
        drained
    }

    fn classify(&self, response: &Response) -> Tag {
        if response.round_id == self.current_round && response.round_id != 0 {
            Tag::Current
        } else if response.round_id >= 1 && response.round_id < self.current_round {
            Tag::Stale
        } else {
            Tag::Invalid
        }
    }

    fn observe(&self, response: &Response, late: bool) {
        self.sink.emit(&RoundEvent::ResponseObserved {
            round_id: response.round_id,
            worker_id: response.worker_id.clone(),
            value: response.value,
            is_correct: response.is_correct,
            late,
        });
    }

    fn reject(&mut self, response: &Response) {
        self.stats.violations += 1;
        let err = QuizError::ArbitrationInvariant {
            response_round: response.round_id,
            current_round: self.current_round,
        };
        warn!(error = %err, worker = %response.worker_id, "response discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChannelSink;
    use crate::mailbox::{self, MailboxSender};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn arbiter() -> (RaceArbiter, MailboxSender, UnboundedReceiver<RoundEvent>) {
        let (tx, rx) = mailbox::channel(32);
        let (sink, events) = ChannelSink::new();
        (RaceArbiter::new(rx, Arc::new(sink)), tx, events)
    }

    fn response(worker: &str, round_id: RoundId, is_correct: bool) -> Response {
        Response {
            worker_id: worker.into(),
            value: if is_correct { 42.0 } else { 7.0 },
            is_correct,
            round_id,
        }
    }

    async fn send_all(tx: &MailboxSender, responses: Vec<Response>) {
        for r in responses {
            tx.send(r).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_first_correct_consumed_wins() {
        let (mut arb, tx, _events) = arbiter();
        send_all(
            &tx,
            vec![
                response("A", 1, false),
                response("B", 1, true),
                response("C", 1, true),
            ],
        )
        .await;

        let outcome = arb.arbitrate(1, 3, 5).await.unwrap();
        assert_eq!(outcome, Outcome::Won("B".into()));

        // C is still in the mailbox and is drained as late.
        assert_eq!(arb.drain(), 1);
        assert_eq!(arb.stats().late_drained, 1);
    }

    #[tokio::test]
    async fn test_zero_budget_exhausts_on_first_wrong() {
        let (mut arb, tx, _events) = arbiter();
        send_all(&tx, vec![response("A", 1, false), response("B", 1, true)]).await;

        let outcome = arb.arbitrate(1, 5, 0).await.unwrap();
        assert_eq!(outcome, Outcome::Exhausted(ExhaustReason::WrongBudget));
        assert_eq!(arb.stats().consumed, 1);
    }

    #[tokio::test]
    async fn test_budget_reached_exhausts() {
        let (mut arb, tx, _events) = arbiter();
        send_all(
            &tx,
            vec![
                response("A", 1, false),
                response("B", 1, false),
                response("C", 1, true),
            ],
        )
        .await;

        let outcome = arb.arbitrate(1, 3, 2).await.unwrap();
        assert_eq!(outcome, Outcome::Exhausted(ExhaustReason::WrongBudget));
    }

    #[tokio::test]
    async fn test_all_responded_without_reaching_budget() {
        let (mut arb, tx, _events) = arbiter();
        send_all(&tx, vec![response("A", 1, false), response("B", 1, false)]).await;

        let outcome = arb.arbitrate(1, 2, 10).await.unwrap();
        assert_eq!(outcome, Outcome::Exhausted(ExhaustReason::AllResponded));
    }

    #[tokio::test]
    async fn test_budget_boundary_wins_over_all_responded() {
        let (mut arb, tx, _events) = arbiter();
        send_all(
            &tx,
            vec![
                response("A", 1, false),
                response("B", 1, false),
                response("C", 1, false),
            ],
        )
        .await;

        let outcome = arb.arbitrate(1, 3, 3).await.unwrap();
        assert_eq!(outcome, Outcome::Exhausted(ExhaustReason::WrongBudget));
    }

    #[tokio::test]
    async fn test_no_responders_fails_fast() {
        let (mut arb, _tx, _events) = arbiter();
        let err = arb.arbitrate(4, 0, 3).await.unwrap_err();
        assert!(matches!(err, QuizError::NoResponders { round_id: 4 }));
    }

    #[tokio::test]
    async fn test_stale_response_never_decides_current_round() {
        let (mut arb, tx, mut events) = arbiter();
        send_all(&tx, vec![response("A", 1, false)]).await;
        arb.arbitrate(1, 1, 5).await.unwrap();

        // A correct answer from round 1 shows up while round 2 is open.
        send_all(
            &tx,
            vec![
                response("B", 1, true),
                response("C", 2, false),
                response("D", 2, true),
            ],
        )
        .await;

        let outcome = arb.arbitrate(2, 2, 5).await.unwrap();
        assert_eq!(outcome, Outcome::Won("D".into()));
        assert_eq!(arb.stats().stale_discarded, 1);

        let mut saw_late_b = false;
        while let Ok(event) = events.try_recv() {
            if let RoundEvent::ResponseObserved { worker_id, round_id, late, .. } = event {
                if worker_id.as_str() == "B" {
                    assert_eq!(round_id, 1);
                    assert!(late);
                    saw_late_b = true;
                }
            }
        }
        assert!(saw_late_b);
    }

    #[tokio::test]
    async fn test_future_round_is_an_invariant_violation() {
        let (mut arb, tx, _events) = arbiter();
        send_all(
            &tx,
            vec![
                response("A", 9, true),
                response("Z", 0, true),
                response("B", 2, true),
            ],
        )
        .await;

        let outcome = arb.arbitrate(2, 3, 5).await.unwrap();
        assert_eq!(outcome, Outcome::Won("B".into()));
        assert_eq!(arb.stats().violations, 2);
    }

    #[tokio::test]
    async fn test_closed_mailbox_is_reported() {
        let (mut arb, tx, _events) = arbiter();
        send_all(&tx, vec![response("A", 1, false)]).await;
        drop(tx);

        let err = arb.arbitrate(1, 3, 5).await.unwrap_err();
        assert!(matches!(err, QuizError::MailboxClosed { round_id: 1 }));
    }

    #[tokio::test]
    async fn test_drain_on_empty_mailbox_returns_immediately() {
        let (mut arb, _tx, _events) = arbiter();
        assert_eq!(arb.drain(), 0);
    }
}
