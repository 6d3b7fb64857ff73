//! # Worker pool: bounded concurrent execution of handler invocations.
//!
//! Each submitted `(handler, payload)` pair becomes one **work unit**: a tokio
//! task that invokes the handler and reports any fault on the [`Bus`]. The pool
//! is owned by the dispatch loop; its outstanding units live in a `JoinSet`.
//!
//! ## Architecture
//! ```text
//! dispatch loop
//!     ├─► reserve()  ── units >= workers? ──► PoolSaturated, join_next() (back-pressure)
//!     ├─► submit()   ── in_flight += 1 ──► spawn unit ──► handler.invoke(payload)
//!     │                                                 ├─ Ok        → done
//!     │                                                 ├─ Failed    → HandlerFailed
//!     │                                                 └─ Panicked  → HandlerPanicked
//!     │                                       in_flight -= 1 (guard drop)
//!     ├─► prune()    ── reap finished units (bounds JoinSet memory)
//!     └─► drain()    ── join every remaining unit
//! ```
//!
//! ## Rules
//! - Worker count is computed once at start ([`worker_count`]); later subscriptions
//!   do not resize the pool.
//! - A faulting unit still counts as complete; it never affects siblings or the loop.
//! - `in_flight` is shared with the dispatcher so `process_all_events` can wait on it.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::core::barrier::Pending;
use crate::error::HandlerError;
use crate::handlers::{Handler, Payload};
use crate::notices::{Bus, Notice, NoticeKind};

/// Computes the pool size from the subscription table shape.
///
/// `max(1, types * max(1, handlers / types))`, with `types == 0` giving 1.
pub(crate) fn worker_count(event_types: usize, total_handlers: usize) -> usize {
    if event_types == 0 {
        return 1;
    }
    let avg_per_type = (total_handlers / event_types).max(1);
    event_types.saturating_mul(avg_per_type).max(1)
}

/// Bounded set of outstanding handler invocations.
pub(crate) struct WorkerPool {
    workers: usize,
    units: JoinSet<()>,
    in_flight: Pending,
    bus: Bus,
    dispatcher: Arc<str>,
}

impl WorkerPool {
    pub(crate) fn new(workers: usize, in_flight: Pending, bus: Bus, dispatcher: Arc<str>) -> Self {
        Self {
            workers: workers.max(1),
            units: JoinSet::new(),
            in_flight,
            bus,
            dispatcher,
        }
    }

    #[cfg(test)]
    pub(crate) fn workers(&self) -> usize {
        self.workers
    }

    /// Units submitted and not yet reaped.
    #[cfg(test)]
    pub(crate) fn outstanding(&self) -> usize {
        self.units.len()
    }

    /// Waits until there is room for one more unit under the ceiling.
    pub(crate) async fn reserve(&mut self) {
        self.prune();
        if self.units.len() < self.workers {
            return;
        }
        self.bus.publish(
            Notice::new(NoticeKind::PoolSaturated)
                .with_dispatcher(Arc::clone(&self.dispatcher))
                .with_workers(self.workers),
        );
        while self.units.len() >= self.workers {
            if self.units.join_next().await.is_none() {
                break;
            }
        }
    }

    /// Schedules one handler invocation and returns immediately.
    pub(crate) fn submit(&mut self, event_type: Arc<str>, handler: Handler, payload: Payload) {
        let guard = self.in_flight.guard();
        let bus = self.bus.clone();
        let dispatcher = Arc::clone(&self.dispatcher);

        self.units.spawn(async move {
            let _guard = guard;
            if let Err(err) = handler.invoke(payload).await {
                publish_fault(&bus, dispatcher, event_type, &handler, &err);
            }
        });
    }

    /// Reaps units that have already finished.
    pub(crate) fn prune(&mut self) {
        while self.units.try_join_next().is_some() {}
    }

    /// Waits for every outstanding unit to finish.
    pub(crate) async fn drain(&mut self) {
        while self.units.join_next().await.is_some() {}
    }
}

/// Publishes `HandlerFailed` or `HandlerPanicked` for a faulted unit.
fn publish_fault(
    bus: &Bus,
    dispatcher: Arc<str>,
    event_type: Arc<str>,
    handler: &Handler,
    err: &HandlerError,
) {
    let kind = if err.is_panic() {
        NoticeKind::HandlerPanicked
    } else {
        NoticeKind::HandlerFailed
    };
    let reason = match err {
        HandlerError::Failed { error } => error.clone(),
        HandlerError::Panicked { info } => info.clone(),
    };
    bus.publish(
        Notice::new(kind)
            .with_dispatcher(dispatcher)
            .with_event_type(event_type)
            .with_handler(handler.name())
            .with_reason(reason),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_worker_count_heuristic() {
        assert_eq!(worker_count(0, 0), 1);
        assert_eq!(worker_count(1, 1), 1);
        assert_eq!(worker_count(1, 3), 3);
        assert_eq!(worker_count(2, 2), 2);
        assert_eq!(worker_count(2, 5), 4);
        assert_eq!(worker_count(3, 1), 3);
        assert_eq!(worker_count(4, 10), 8);
    }

    fn pool(workers: usize) -> (WorkerPool, Pending, Bus) {
        let in_flight = Pending::new();
        let bus = Bus::new(64);
        let pool = WorkerPool::new(workers, in_flight.clone(), bus.clone(), "test".into());
        (pool, in_flight, bus)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ceiling_bounds_concurrency() {
        let (mut pool, in_flight, _bus) = pool(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let h = {
            let running = running.clone();
            let peak = peak.clone();
            Handler::new_async("slow", move |_p: Payload| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, HandlerError>(())
                }
            })
        };

        for _ in 0..8 {
            pool.reserve().await;
            assert!(pool.outstanding() < pool.workers());
            pool.submit("evt.a".into(), h.clone(), Payload::empty());
        }
        pool.drain().await;

        assert_eq!(in_flight.count(), 0);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_faults_are_reported_and_counted_complete() {
        let (mut pool, in_flight, bus) = pool(4);
        let mut rx = bus.subscribe();

        let failing = Handler::new_sync("failing", |_p: Payload| Err(HandlerError::fail("bad input")));
        let panicking = Handler::new_async("panicking", |_p: Payload| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<_, HandlerError>(())
        });

        pool.submit("evt.a".into(), failing, Payload::empty());
        pool.submit("evt.a".into(), panicking, Payload::empty());
        in_flight.wait_idle().await;
        pool.drain().await;

        let mut seen = Vec::new();
        while let Ok(n) = rx.try_recv() {
            seen.push((n.kind, n.handler.as_deref().map(str::to_owned), n.reason.as_deref().map(str::to_owned)));
        }
        seen.sort_by_key(|(_, h, _)| h.clone());
        assert_eq!(
            seen,
            vec![
                (NoticeKind::HandlerFailed, Some("failing".into()), Some("bad input".into())),
                (NoticeKind::HandlerPanicked, Some("panicking".into()), Some("kaboom".into())),
            ]
        );
    }

    #[tokio::test]
    async fn test_saturation_is_published() {
        let (mut pool, _in_flight, bus) = pool(1);
        let mut rx = bus.subscribe();
        let h = Handler::new_async("sleepy", |_p: Payload| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, HandlerError>(())
        });

        pool.reserve().await;
        pool.submit("evt.a".into(), h.clone(), Payload::empty());
        pool.reserve().await;
        pool.submit("evt.a".into(), h, Payload::empty());
        pool.drain().await;

        let n = rx.try_recv().expect("saturation notice");
        assert_eq!(n.kind, NoticeKind::PoolSaturated);
        assert_eq!(n.workers, Some(1));
    }
}
