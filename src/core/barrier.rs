//! # Pending counter with an async quiescence wait.
//!
//! [`Pending`] counts items that have been handed over but not yet finished and
//! lets any number of callers wait until the count drops to zero. It backs both
//! the event queue's `join()` and the worker pool's outstanding-work set.
//!
//! ## Rules
//! - `add()` / `done()` may be called from any task or thread.
//! - `wait_idle()` returns as soon as the count is observed at zero; it does not
//!   snapshot, so work added while waiting is waited for too.
//! - Waiting suspends on a `watch` channel; there is no polling.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared counter of unfinished items.
#[derive(Clone, Debug)]
pub(crate) struct Pending {
    tx: Arc<watch::Sender<usize>>,
}

impl Pending {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(0usize);
        Self { tx: Arc::new(tx) }
    }

    pub(crate) fn add(&self) {
        self.tx.send_modify(|n| *n += 1);
    }

    pub(crate) fn done(&self) {
        self.tx.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Increments the counter and returns a guard that decrements it on drop.
    pub(crate) fn guard(&self) -> PendingGuard {
        self.add();
        PendingGuard {
            pending: self.clone(),
        }
    }

    pub(crate) fn count(&self) -> usize {
        *self.tx.borrow()
    }

    /// Suspends until the counter reads zero.
    pub(crate) async fn wait_idle(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// Decrements its [`Pending`] counter when dropped (including on unwind).
#[derive(Debug)]
pub(crate) struct PendingGuard {
    pending: Pending,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.done();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_idle_counter_returns_immediately() {
        let p = Pending::new();
        p.wait_idle().await;
        assert_eq!(p.count(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_resumes_when_guard_drops() {
        let p = Pending::new();
        let guard = p.guard();
        assert_eq!(p.count(), 1);

        let waiter = {
            let p = p.clone();
            tokio::spawn(async move { p.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter resumed")
            .unwrap();
    }

    #[test]
    fn test_done_never_underflows() {
        let p = Pending::new();
        p.done();
        assert_eq!(p.count(), 0);
    }
}
