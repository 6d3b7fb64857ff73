//! # Dispatch loop: drains the event queue into the worker pool.
//!
//! One loop runs per `Running` period. It is spawned by `Dispatcher::start` and
//! joined by `Dispatcher::stop`.
//!
//! ```text
//! loop {
//!   ├─► select (biased):
//!   │     ├─ stop token cancelled  → leave loop (no new dequeues)
//!   │     └─ dequeue() → QueuedEvent / None (queue closed) → leave loop
//!   ├─► snapshot handlers for event_type (read lock, copy)
//!   │     └─ empty → publish EventUnrouted
//!   ├─► for each handler, in registration order:
//!   │     ├─ pool.reserve()   (back-pressure at the worker ceiling)
//!   │     └─ pool.submit(handler, payload)
//!   ├─► mark_done(event)      (after all submissions, not completions)
//!   └─► pool.prune()
//! }
//! pool.drain()                 (in-flight units run to completion)
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::pool::WorkerPool;
use crate::core::queue::{EventReceiver, QueuedEvent};
use crate::core::table::SubscriptionTable;
use crate::notices::{Bus, Notice, NoticeKind};

pub(crate) struct DispatchLoop {
    receiver: EventReceiver,
    pool: WorkerPool,
    table: Arc<SubscriptionTable>,
    bus: Bus,
    dispatcher: Arc<str>,
}

impl DispatchLoop {
    pub(crate) fn new(
        receiver: EventReceiver,
        pool: WorkerPool,
        table: Arc<SubscriptionTable>,
        bus: Bus,
        dispatcher: Arc<str>,
    ) -> Self {
        Self {
            receiver,
            pool,
            table,
            bus,
            dispatcher,
        }
    }

    /// Runs until `stop` is cancelled or the queue closes, then drains the pool.
    pub(crate) async fn run(mut self, stop: CancellationToken) {
        loop {
            let item = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                item = self.receiver.dequeue() => match item {
                    Some(item) => item,
                    None => break,
                },
            };
            self.dispatch(item).await;
        }
        self.pool.drain().await;
    }

    /// Fans one event out to every handler registered for its type.
    async fn dispatch(&mut self, item: QueuedEvent) {
        let handlers = self.table.handlers_for(&item.event_type);
        if handlers.is_empty() {
            self.bus.publish(
                Notice::new(NoticeKind::EventUnrouted)
                    .with_dispatcher(Arc::clone(&self.dispatcher))
                    .with_event_type(Arc::clone(&item.event_type)),
            );
        }

        for handler in handlers {
            self.pool.reserve().await;
            self.pool.submit(
                Arc::clone(&item.event_type),
                handler,
                item.payload.clone(),
            );
        }

        self.receiver.mark_done(item);
        self.pool.prune();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::core::barrier::Pending;
    use crate::core::queue;
    use crate::error::HandlerError;
    use crate::handlers::{Handler, Payload};

    fn recorder(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Handler {
        Handler::new_sync(name, move |p: Payload| {
            let data = p.get("dummy_data").and_then(|v| v.as_str()).unwrap_or("");
            log.lock().unwrap().push(format!("{name}:{data}"));
            Ok::<(), HandlerError>(())
        })
    }

    fn payload(data: &str) -> Payload {
        Payload::try_from(serde_json::json!({ "dummy_data": data })).unwrap()
    }

    #[tokio::test]
    async fn test_loop_dispatches_then_drains_on_close() {
        let table = Arc::new(SubscriptionTable::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        table.subscribe("evt.a", recorder("h1", log.clone()));
        table.subscribe("evt.a", recorder("h2", log.clone()));

        let bus = Bus::new(16);
        let in_flight = Pending::new();
        let pool = WorkerPool::new(2, in_flight.clone(), bus.clone(), "t".into());
        let (q, rx) = queue::channel();
        let lp = DispatchLoop::new(rx, pool, table, bus, "t".into());

        q.enqueue("evt.a".into(), payload("x")).unwrap();
        let pending = q.pending();
        drop(q);

        tokio::time::timeout(Duration::from_secs(2), lp.run(CancellationToken::new()))
            .await
            .expect("loop finished after queue closed");

        assert_eq!(pending.count(), 0);
        assert_eq!(in_flight.count(), 0);
        let mut got = log.lock().unwrap().clone();
        got.sort();
        assert_eq!(got, vec!["h1:x".to_string(), "h2:x".to_string()]);
    }

    #[tokio::test]
    async fn test_unrouted_event_is_reported_and_marked_done() {
        let table = Arc::new(SubscriptionTable::new());
        let bus = Bus::new(16);
        let mut notices = bus.subscribe();
        let pool = WorkerPool::new(1, Pending::new(), bus.clone(), "t".into());
        let (q, rx) = queue::channel();
        let stop = CancellationToken::new();
        let task = tokio::spawn(DispatchLoop::new(rx, pool, table, bus, "t".into()).run(stop.clone()));

        q.enqueue("evt.ghost".into(), Payload::empty()).unwrap();
        q.join().await;
        stop.cancel();
        task.await.unwrap();

        let n = notices.recv().await.unwrap();
        assert_eq!(n.kind, NoticeKind::EventUnrouted);
        assert_eq!(n.event_type.as_deref(), Some("evt.ghost"));
    }
}
