use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::mailbox::MailboxSender;
use crate::problem::Problem;
use crate::worker::{Temperament, Worker, WorkerId};
use crate::RoundId;

struct Member {
    worker: Worker,
    rng: Xoshiro256PlusPlus,
}

/// Fixed set of workers. Membership is decided at construction and never changes.
pub struct WorkerPool {
    members: Vec<Member>,
    mailbox: MailboxSender,
    in_flight: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Build a pool; each member gets its own RNG forked from `rng`.
    pub fn new(
        ids: Vec<WorkerId>,
        temperament: Temperament,
        rng: &mut Xoshiro256PlusPlus,
        mailbox: MailboxSender,
    ) -> Self {
        let members = ids
            .into_iter()
            .map(|id| Member {
                worker: Worker::new(id, temperament),
                rng: Xoshiro256PlusPlus::seed_from_u64(rng.gen()),
            })
            .collect();

        Self {
            members,
            mailbox,
            in_flight: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.members.iter().map(|m| m.worker.id().clone()).collect()
    }

    /// Start one response task per member and return without waiting.
    /// Returns the number of responders started.
    pub fn broadcast(&mut self, problem: Arc<Problem>, round_id: RoundId) -> usize {
        self.in_flight.retain(|handle| !handle.is_finished());

        for member in &mut self.members {
            let worker = member.worker.clone();
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(member.rng.gen());
            let problem = Arc::clone(&problem);
            let mailbox = self.mailbox.clone();

            self.in_flight.push(tokio::spawn(async move {
                let response = worker.respond(&problem, round_id, &mut rng).await;
                if mailbox.send(response).await.is_err() {
                    debug!(worker = %worker.id(), round_id, "mailbox closed, response dropped");
                }
            }));
        }

        debug!(round_id, responders = self.members.len(), "problem broadcast");
        self.members.len()
    }

    /// Worker tasks started but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every outstanding worker task. Think time is bounded, so this returns.
    pub async fn shutdown(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task failed");
            }
        }
    }
}
