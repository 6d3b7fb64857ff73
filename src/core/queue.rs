//! # Event queue: unbounded FIFO with a join barrier.
//!
//! The queue is split into a producer half ([`EventQueue`], held by the
//! dispatcher and used by `post`) and a consumer half ([`EventReceiver`], owned
//! by the dispatch loop).
//!
//! ```text
//! post() ──► EventQueue::enqueue ──► [mpsc unbounded] ──► EventReceiver::dequeue ──► dispatch
//!                 │ pending += 1                                    │
//!                 └──────────────────── pending -= 1 ◄── mark_done(item)
//! ```
//!
//! ## Rules
//! - `enqueue` never blocks.
//! - Every enqueued item bumps `pending`; `mark_done` consumes the item, so it can
//!   run at most once per dequeued item.
//! - `join` waits until `pending` reads zero, including items enqueued while waiting.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::barrier::Pending;
use crate::error::DispatchError;
use crate::handlers::Payload;

/// A posted `(event type, payload)` pair awaiting dispatch.
#[derive(Debug)]
pub(crate) struct QueuedEvent {
    pub(crate) event_type: Arc<str>,
    pub(crate) payload: Payload,
}

/// Producer half of the queue.
#[derive(Clone, Debug)]
pub(crate) struct EventQueue {
    tx: mpsc::UnboundedSender<QueuedEvent>,
    pending: Pending,
}

/// Consumer half of the queue.
#[derive(Debug)]
pub(crate) struct EventReceiver {
    rx: mpsc::UnboundedReceiver<QueuedEvent>,
    pending: Pending,
}

/// Creates a connected producer/consumer pair.
pub(crate) fn channel() -> (EventQueue, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Pending::new();
    (
        EventQueue {
            tx,
            pending: pending.clone(),
        },
        EventReceiver { rx, pending },
    )
}

impl EventQueue {
    /// Appends an event; fails with `NotRunning` once the consumer is gone.
    pub(crate) fn enqueue(&self, event_type: Arc<str>, payload: Payload) -> Result<(), DispatchError> {
        self.pending.add();
        if self.tx.send(QueuedEvent { event_type, payload }).is_err() {
            self.pending.done();
            return Err(DispatchError::NotRunning);
        }
        Ok(())
    }

    /// Waits until every enqueued item has been marked done.
    pub(crate) async fn join(&self) {
        self.pending.wait_idle().await;
    }

    /// Handle on the pending counter, for waiting without holding the queue.
    pub(crate) fn pending(&self) -> Pending {
        self.pending.clone()
    }
}

impl EventReceiver {
    /// Waits for the next item; `None` once every producer is dropped and the queue is empty.
    pub(crate) async fn dequeue(&mut self) -> Option<QueuedEvent> {
        self.rx.recv().await
    }

    /// Marks a dequeued item as fully submitted.
    pub(crate) fn mark_done(&self, item: QueuedEvent) {
        drop(item);
        self.pending.done();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_fifo_and_join() {
        let (queue, mut rx) = channel();
        queue.enqueue("evt.a".into(), Payload::empty()).unwrap();
        queue.enqueue("evt.b".into(), Payload::empty()).unwrap();
        assert_eq!(queue.pending().count(), 2);

        let joiner = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.join().await })
        };

        let first = rx.dequeue().await.unwrap();
        assert_eq!(&*first.event_type, "evt.a");
        rx.mark_done(first);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!joiner.is_finished());

        let second = rx.dequeue().await.unwrap();
        assert_eq!(&*second.event_type, "evt.b");
        rx.mark_done(second);

        tokio::time::timeout(Duration::from_secs(1), joiner)
            .await
            .expect("join resumed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_after_receiver_dropped_is_rejected() {
        let (queue, rx) = channel();
        drop(rx);
        let err = queue.enqueue("evt.a".into(), Payload::empty()).unwrap_err();
        assert_eq!(err, DispatchError::NotRunning);
        assert_eq!(queue.pending().count(), 0);
    }

    #[tokio::test]
    async fn test_receiver_ends_when_producers_drop() {
        let (queue, mut rx) = channel();
        queue.enqueue("evt.a".into(), Payload::empty()).unwrap();
        drop(queue);
        assert!(rx.dequeue().await.is_some());
        assert!(rx.dequeue().await.is_none());
    }
}
