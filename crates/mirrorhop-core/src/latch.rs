//! Decide-once latch.
//!
//! Several concurrent signals race to settle a single value; only the first
//! caller of [`DecideOnce::decide`] wins. The winner is delivered through a
//! oneshot channel and every later call is a no-op that reports `false`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

/// Resolve-once primitive around a single-use channel.
#[derive(Debug)]
pub struct DecideOnce<T> {
    decided: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> DecideOnce<T> {
    /// Create a latch and the receiver that observes its decision.
    #[must_use]
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let latch = Self {
            decided: AtomicBool::new(false),
            sender: Mutex::new(Some(tx)),
        };
        (latch, rx)
    }

    /// Attempt to settle the latch with `value`.
    ///
    /// Returns `true` only for the call that actually decided.
    pub fn decide(&self, value: T) -> bool {
        if self
            .decided
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(tx) = sender {
            // Receiver may already be gone if the caller stopped waiting.
            let _ = tx.send(value);
        }
        true
    }

    /// Whether a decision has been made.
    pub fn is_decided(&self) -> bool {
        self.decided.load(Ordering::Acquire)
    }
}
