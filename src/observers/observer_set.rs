//! # Non-blocking notice fan-out to multiple observers.
//!
//! Provides [`ObserverSet`], which distributes notices to multiple observers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(notice)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► observer1.on_notice()
//!     │    (bounded)         └──────► panic → ObserverPanicked
//!     ├──► [queue 2] ──► worker 2 ──► observer2.on_notice()
//!     └──► [queue N] ──► worker N ──► observerN.on_notice()
//! ```
//!
//! ## Rules
//! - **No cross-observer ordering**: observer A may process notice N while B processes N+5
//! - **Overflow**: notice dropped for that observer only, `ObserverOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: slow/panicking observer doesn't affect others
//! - **Per-observer FIFO**: each observer sees notices in order
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if an observer panics while holding a lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_info;
use crate::notices::{Bus, Notice};
use crate::observers::Observe;

/// Per-observer channel metadata.
struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Notice>>,
}

/// Fan-out coordinator for multiple notice observers.
pub struct ObserverSet {
    channels: Vec<ObserverChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl ObserverSet {
    /// Creates a new set and spawns one worker task per observer.
    ///
    /// Must be called from within a tokio runtime. Minimum queue capacity is 1.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for obs in observers {
            let cap = obs.queue_capacity().max(1);
            let name = obs.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Notice>>(cap);
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(notice) = rx.recv().await {
                    let fut = obs.on_notice(notice.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_info(&*panic_err);
                        bus_for_worker.publish(Notice::observer_panicked(obs.name(), info));
                    }
                }
            });
            channels.push(ObserverChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Returns `true` if the set has no observers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits a notice to all observers (clones the notice once).
    pub fn emit(&self, notice: &Notice) {
        self.emit_arc(Arc::new(notice.clone()));
    }

    /// Emits a pre-allocated `Arc<Notice>` to all observers.
    ///
    /// Overflow notices are not re-published when they themselves overflow.
    pub fn emit_arc(&self, notice: Arc<Notice>) {
        let is_overflow = notice.is_observer_overflow();

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&notice)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow {
                self.bus
                    .publish(Notice::observer_overflow(channel.name, reason));
            }
        }
    }

    /// Gracefully shuts down all observer workers.
    ///
    /// Drops the senders, then awaits every worker so queued notices are flushed.
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::notices::NoticeKind;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<NoticeKind>>,
    }

    #[async_trait]
    impl Observe for Recorder {
        async fn on_notice(&self, notice: &Notice) {
            self.seen.lock().unwrap().push(notice.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploding;

    #[async_trait]
    impl Observe for Exploding {
        async fn on_notice(&self, _notice: &Notice) {
            panic!("observer blew up");
        }
        fn name(&self) -> &'static str {
            "exploding"
        }
    }

    #[tokio::test]
    async fn test_every_observer_receives_notices_in_order() {
        let bus = Bus::new(16);
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let set = ObserverSet::new(vec![a.clone(), b.clone()], bus);

        set.emit(&Notice::new(NoticeKind::DispatcherStarted));
        set.emit(&Notice::new(NoticeKind::DispatcherStopped));
        set.shutdown().await;

        let expected = vec![NoticeKind::DispatcherStarted, NoticeKind::DispatcherStopped];
        assert_eq!(*a.seen.lock().unwrap(), expected);
        assert_eq!(*b.seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_panicking_observer_is_reported_and_isolated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder::default());
        let set = ObserverSet::new(vec![Arc::new(Exploding), rec.clone()], bus);

        set.emit(&Notice::new(NoticeKind::EventUnrouted));
        set.shutdown().await;

        let got = rx.recv().await.expect("panic notice");
        assert_eq!(got.kind, NoticeKind::ObserverPanicked);
        assert_eq!(got.handler.as_deref(), Some("exploding"));
        assert_eq!(got.reason.as_deref(), Some("observer blew up"));
        assert_eq!(*rec.seen.lock().unwrap(), vec![NoticeKind::EventUnrouted]);
    }
}
