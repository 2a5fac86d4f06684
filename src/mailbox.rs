//! The shared mailbox between workers and the arbiter.
//!
//! Workers only send, the arbiter is the sole receiver. The channel is bounded
//! with a capacity large enough that a worker's single send never waits:
//!
//! `capacity = workers * (1 + ceil(think_max / pause))`
//!
//! Rounds are dispatched at least `pause` apart and a worker sends at most
//! `think_max` after its round was dispatched, so no more than
//! `1 + ceil(think_max / pause)` rounds of responses can sit in the mailbox at
//! once. The supervisor additionally drains it after every resolved round.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::worker::Response;

pub type MailboxSender = mpsc::Sender<Response>;
pub type MailboxReceiver = mpsc::Receiver<Response>;

const MIN_PAUSE: Duration = Duration::from_millis(1);

/// Largest buffer `tokio::sync::mpsc::channel` accepts.
pub const MAX_CAPACITY: usize = usize::MAX >> 3;

/// Saturates at `usize::MAX` instead of overflowing; callers compare the
/// result against [`MAX_CAPACITY`].
pub fn capacity(worker_count: usize, think_max: Duration, pause: Duration) -> usize {
    let pause_ms = pause.max(MIN_PAUSE).as_millis();
    let rounds = think_max.as_millis().div_ceil(pause_ms).saturating_add(1);
    let total = (worker_count.max(1) as u128).saturating_mul(rounds);
    usize::try_from(total).unwrap_or(usize::MAX)
}

/// Capacity is clamped to `1..=MAX_CAPACITY`.
pub fn channel(capacity: usize) -> (MailboxSender, MailboxReceiver) {
    mpsc::channel(capacity.clamp(1, MAX_CAPACITY))
}
