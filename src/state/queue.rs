//! Per-connection outbound queue and wakeup.
//!
//! Any task may enqueue a wire line for a connection; only the owning
//! supervisor drains. The notifier coalesces: however many senders fire
//! between two drains, the supervisor wakes once and [`drain`] removes
//! everything present at that moment. Queueing is therefore explicit
//! and bounded rather than attached to the notification itself.
//!
//! [`drain`]: SendQueue::drain

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Outbound lines a connection will buffer before dropping new ones.
pub const WRITE_QUEUE_SIZE: usize = 32;

/// Result of an enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Queued,
    /// The queue was saturated; the new line was dropped, prior entries
    /// are untouched.
    Full,
}

/// Bounded FIFO of complete wire lines plus the owner's wakeup signal.
pub struct SendQueue {
    lines: Mutex<VecDeque<String>>,
    wakeup: Notify,
}

impl Default for SendQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SendQueue {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(WRITE_QUEUE_SIZE)),
            wakeup: Notify::new(),
        }
    }

    /// Append a line, unless the queue is saturated.
    pub fn push(&self, line: impl Into<String>) -> Enqueue {
        let mut lines = self.lines.lock();
        if lines.len() >= WRITE_QUEUE_SIZE {
            return Enqueue::Full;
        }
        lines.push_back(line.into());
        Enqueue::Queued
    }

    /// Append a line and fire the owner's wakeup.
    pub fn push_and_wake(&self, line: impl Into<String>) -> Enqueue {
        let outcome = self.push(line);
        self.wake();
        outcome
    }

    /// Take everything queued at this instant.
    pub fn drain(&self) -> Vec<String> {
        let mut lines = self.lines.lock();
        lines.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Fire the wakeup. Idempotent: fires between drains coalesce.
    pub fn wake(&self) {
        self.wakeup.notify_one();
    }

    /// Wait until some sender fires the wakeup.
    pub async fn wait(&self) {
        self.wakeup.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_is_preserved() {
        let q = SendQueue::new();
        q.push("one\r\n");
        q.push("two\r\n");
        q.push("three\r\n");
        assert_eq!(q.drain(), vec!["one\r\n", "two\r\n", "three\r\n"]);
        assert!(q.is_empty());
    }

    #[test]
    fn saturation_drops_the_new_line_only() {
        let q = SendQueue::new();
        for i in 0..WRITE_QUEUE_SIZE {
            assert_eq!(q.push(format!("line {i}\r\n")), Enqueue::Queued);
        }
        // The 33rd pending line is dropped.
        assert_eq!(q.push("overflow\r\n"), Enqueue::Full);
        let drained = q.drain();
        assert_eq!(drained.len(), WRITE_QUEUE_SIZE);
        assert_eq!(drained[0], "line 0\r\n");
        assert_eq!(drained[WRITE_QUEUE_SIZE - 1], format!("line {}\r\n", WRITE_QUEUE_SIZE - 1));
    }

    #[test]
    fn drain_resets_capacity_accounting() {
        let q = SendQueue::new();
        for _ in 0..WRITE_QUEUE_SIZE {
            q.push("x\r\n");
        }
        assert_eq!(q.push("y\r\n"), Enqueue::Full);
        q.drain();
        assert_eq!(q.push("y\r\n"), Enqueue::Queued);
    }

    #[tokio::test]
    async fn wakeup_coalesces_multiple_fires() {
        let q = std::sync::Arc::new(SendQueue::new());
        q.push_and_wake("a\r\n");
        q.push_and_wake("b\r\n");
        q.push_and_wake("c\r\n");

        // One wake suffices to observe everything enqueued so far.
        q.wait().await;
        assert_eq!(q.drain().len(), 3);

        // No stale second permit: a fresh wait only completes after a
        // fresh wake.
        let waiter = {
            let q = q.clone();
            tokio::spawn(async move {
                q.wait().await;
                q.drain().len()
            })
        };
        tokio::task::yield_now().await;
        q.push_and_wake("d\r\n");
        assert_eq!(waiter.await.unwrap(), 1);
    }
}
