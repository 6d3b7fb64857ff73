//! # Dispatcher: subscription table, event queue and lifecycle control.
//!
//! The [`Dispatcher`] is the public entry point. Producers [`post`](Dispatcher::post)
//! events, subscribers [`subscribe`](Dispatcher::subscribe) handlers, and the
//! dispatcher fans every posted event out to the handlers registered for its type.
//!
//! ## Lifecycle
//! ```text
//!            start()                stop()                 drain done
//!   Idle ────────────► Running ────────────► Draining ────────────────► Stopped
//!                         ▲                                                │
//!                         └──────────────────── start() ───────────────────┘
//! ```
//!
//! - `start()`: sizes the worker pool from the current table, spawns the dispatch loop.
//! - `stop()`: rejects new posts and spawns the teardown task, which waits for
//!   queue `join()`, cancels dequeuing, waits for outstanding units, then
//!   releases the queue/pool/task and clears the subscription table. `stop()`
//!   returns once `Stopped` is reached; dropping its future early does not
//!   interrupt the teardown.
//!
//! ## Concurrency
//! Works on both `current_thread` (cooperative) and `multi_thread` (parallel)
//! tokio runtimes. `start()` and `DispatcherBuilder::build` must be called from
//! within a runtime.
//!
//! ## Deadlock note
//! Handlers may `post` follow-up events, but must not await `process_all_events`
//! or `stop` on their own dispatcher: both wait for the calling unit itself.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::{
    barrier::Pending,
    builder::DispatcherBuilder,
    config::DispatcherConfig,
    dispatch_loop::DispatchLoop,
    pool::{WorkerPool, worker_count},
    queue::{self, EventQueue},
    table::{SubscribeOutcome, SubscriptionTable},
};
use crate::error::DispatchError;
use crate::handlers::{Handler, Payload};
use crate::notices::{Bus, Notice, NoticeKind};
use crate::observers::ObserverSet;

/// Dispatcher lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, never started.
    Idle,
    /// Accepting posts; dispatch loop consuming the queue.
    Running,
    /// `stop()` in progress: no new posts, existing work finishing.
    Draining,
    /// Fully stopped; may be started again.
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Transient state rebuilt on every `start()`.
struct Active {
    queue: EventQueue,
    in_flight: Pending,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
    workers: usize,
}

/// In-process publish/subscribe dispatcher.
///
/// Each instance owns an isolated subscription table, queue and pool.
pub struct Dispatcher {
    cfg: DispatcherConfig,
    name: Arc<str>,
    bus: Bus,
    table: Arc<SubscriptionTable>,
    state: Arc<watch::Sender<LifecycleState>>,
    active: Arc<Mutex<Option<Active>>>,
    /// Cancelled on drop; ends the observer listener.
    shutdown: CancellationToken,
}

impl Dispatcher {
    /// Creates an idle dispatcher without observers.
    pub fn new(cfg: DispatcherConfig) -> Self {
        let (state, _rx) = watch::channel(LifecycleState::Idle);
        Self {
            name: Arc::from(cfg.name.as_ref()),
            bus: Bus::new(cfg.bus_capacity_clamped()),
            table: Arc::new(SubscriptionTable::new()),
            state: Arc::new(state),
            active: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
            cfg,
        }
    }

    /// Returns a builder for attaching observers.
    pub fn builder(cfg: DispatcherConfig) -> DispatcherBuilder {
        DispatcherBuilder::new(cfg)
    }

    /// Forwards bus notices to `observers` until the dispatcher is dropped.
    pub(crate) fn attach_observers(&self, observers: ObserverSet) {
        if observers.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(notice) => observers.emit(&notice),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            observers.shutdown().await;
        });
    }

    /// Starts the dispatcher.
    ///
    /// The worker count is computed once, here, from the current subscriptions.
    /// Fails with [`DispatchError::AlreadyRunning`] while `Running` or `Draining`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime (the dispatch loop is spawned here).
    pub fn start(&self) -> Result<(), DispatchError> {
        let mut active = self.lock_active();
        let state = self.state();
        if matches!(state, LifecycleState::Running | LifecycleState::Draining) {
            return Err(DispatchError::AlreadyRunning { state });
        }

        let (types, handlers) = self.table.shape();
        let workers = self.size_pool(types, handlers);

        let (queue, receiver) = queue::channel();
        let in_flight = Pending::new();
        let stop = CancellationToken::new();
        let pool = WorkerPool::new(
            workers,
            in_flight.clone(),
            self.bus.clone(),
            Arc::clone(&self.name),
        );
        let dispatch = DispatchLoop::new(
            receiver,
            pool,
            Arc::clone(&self.table),
            self.bus.clone(),
            Arc::clone(&self.name),
        );
        let task = tokio::spawn(dispatch.run(stop.clone()));

        *active = Some(Active {
            queue,
            in_flight,
            stop,
            task: Some(task),
            workers,
        });
        self.state.send_replace(LifecycleState::Running);
        drop(active);

        self.bus.publish(
            Notice::new(NoticeKind::DispatcherStarted)
                .with_dispatcher(Arc::clone(&self.name))
                .with_workers(workers),
        );
        Ok(())
    }

    /// Stops the dispatcher and waits for the drain to finish.
    ///
    /// Already queued and in-flight work runs to completion. Subscriptions are
    /// cleared. Calling `stop()` when not running is a no-op; a concurrent caller
    /// waits for the in-progress stop.
    ///
    /// The drain runs on its own task: if this future is dropped (timeout,
    /// `select!`), the dispatcher still reaches `Stopped`.
    pub async fn stop(&self) {
        {
            let mut active = lock(&self.active);
            match (self.state(), active.as_mut()) {
                (LifecycleState::Running, Some(a)) => {
                    self.state.send_replace(LifecycleState::Draining);
                    self.bus.publish(
                        Notice::new(NoticeKind::StopRequested)
                            .with_dispatcher(Arc::clone(&self.name)),
                    );
                    let teardown = Teardown {
                        queue: a.queue.clone(),
                        in_flight: a.in_flight.clone(),
                        stop: a.stop.clone(),
                        task: a.task.take(),
                        active: Arc::clone(&self.active),
                        table: Arc::clone(&self.table),
                        state: Arc::clone(&self.state),
                        bus: self.bus.clone(),
                        name: Arc::clone(&self.name),
                    };
                    tokio::spawn(teardown.run());
                }
                (LifecycleState::Draining, _) => {}
                _ => return,
            }
        }
        self.wait_while_draining().await;
    }

    /// Registers `handler` for `event_type`.
    ///
    /// Never fails with an error value; see [`SubscribeOutcome`].
    pub fn subscribe(&self, event_type: &str, handler: Handler) -> SubscribeOutcome {
        self.table.subscribe(event_type, handler)
    }

    /// Posts an event for asynchronous delivery.
    ///
    /// ### Errors
    /// - [`DispatchError::NotRunning`] unless the dispatcher is `Running`
    ///   (checked first);
    /// - [`DispatchError::NoSubscribers`] if `event_type` has no handlers.
    pub fn post(&self, event_type: &str, payload: impl Into<Payload>) -> Result<(), DispatchError> {
        let active = self.lock_active();
        let state = self.state();
        let queue = match active.as_ref() {
            Some(a) if state == LifecycleState::Running => &a.queue,
            _ => return Err(DispatchError::NotRunning),
        };
        if !self.table.has_handlers(event_type) {
            return Err(DispatchError::NoSubscribers {
                event_type: event_type.to_string(),
            });
        }
        queue.enqueue(Arc::from(event_type), payload.into())
    }

    /// Returns a copy of the subscription table.
    pub fn subscriptions(&self) -> HashMap<String, Vec<Handler>> {
        self.table.snapshot()
    }

    /// Waits until every event posted so far has been dispatched and every
    /// resulting handler invocation has finished.
    ///
    /// Returns immediately when not started or when nothing is pending.
    pub async fn process_all_events(&self) {
        let (queue, in_flight) = {
            let active = self.lock_active();
            match active.as_ref() {
                Some(a) => (a.queue.clone(), a.in_flight.clone()),
                None => return,
            }
        };
        queue.join().await;
        in_flight.wait_idle().await;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Number of posted events not yet fully submitted to the pool.
    pub fn pending_events(&self) -> usize {
        self.lock_active()
            .as_ref()
            .map_or(0, |a| a.queue.pending().count())
    }

    /// Number of handler invocations submitted and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.lock_active()
            .as_ref()
            .map_or(0, |a| a.in_flight.count())
    }

    /// Returns the worker pool size, if started.
    pub fn workers(&self) -> Option<usize> {
        self.lock_active().as_ref().map(|a| a.workers)
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatcherConfig {
        &self.cfg
    }

    /// Returns a receiver for runtime notices published after this call.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.bus.subscribe()
    }

    pub(crate) fn bus(&self) -> Bus {
        self.bus.clone()
    }

    fn size_pool(&self, types: usize, handlers: usize) -> usize {
        let n = worker_count(types, handlers);
        match self.cfg.worker_limit() {
            Some(cap) => n.min(cap),
            None => n,
        }
    }

    async fn wait_while_draining(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| *s != LifecycleState::Draining).await;
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<Active>> {
        lock(&self.active)
    }
}

fn lock(active: &Mutex<Option<Active>>) -> MutexGuard<'_, Option<Active>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drain and finalize sequence spawned by `stop()`.
///
/// Owns everything it touches, so it completes even if no caller is left
/// waiting on it.
struct Teardown {
    queue: EventQueue,
    in_flight: Pending,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
    active: Arc<Mutex<Option<Active>>>,
    table: Arc<SubscriptionTable>,
    state: Arc<watch::Sender<LifecycleState>>,
    bus: Bus,
    name: Arc<str>,
}

impl Teardown {
    async fn run(self) {
        self.queue.join().await;
        self.stop.cancel();
        if let Some(task) = self.task {
            if let Err(je) = task.await {
                self.bus.publish(
                    Notice::new(NoticeKind::TeardownFailed)
                        .with_dispatcher(Arc::clone(&self.name))
                        .with_reason(je.to_string()),
                );
            }
        }
        self.in_flight.wait_idle().await;

        {
            let mut active = lock(&self.active);
            *active = None;
            self.table.clear();
            self.state.send_replace(LifecycleState::Stopped);
        }

        self.bus.publish(
            Notice::new(NoticeKind::DispatcherStopped).with_dispatcher(self.name),
        );
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
