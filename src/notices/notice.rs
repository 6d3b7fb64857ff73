//! # Runtime notices emitted by the dispatcher.
//!
//! The [`NoticeKind`] enum classifies diagnostics across three categories:
//! - **Lifecycle notices**: start, stop request, stopped, teardown faults
//! - **Dispatch notices**: pool saturation, unrouted events, handler faults
//! - **Observer notices**: observer queue overflow and panics
//!
//! The [`Notice`] struct carries additional metadata such as timestamps, the
//! dispatcher name, the event type and handler involved, and a reason.
//!
//! ## Ordering guarantees
//! Each notice has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Notice, NoticeKind};
//!
//! let n = Notice::new(NoticeKind::HandlerFailed)
//!     .with_event_type("evt.a")
//!     .with_handler("audit")
//!     .with_reason("boom");
//!
//! assert_eq!(n.kind, NoticeKind::HandlerFailed);
//! assert_eq!(n.handler.as_deref(), Some("audit"));
//! assert_eq!(n.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for notice ordering.
static NOTICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    // === Lifecycle ===
    /// Dispatcher entered `Running`.
    ///
    /// Sets:
    /// - `dispatcher`: dispatcher name
    /// - `workers`: worker pool size computed at start
    DispatcherStarted,

    /// `stop()` was called; dispatcher entered `Draining`.
    ///
    /// Sets:
    /// - `dispatcher`: dispatcher name
    StopRequested,

    /// Drain finished; dispatcher entered `Stopped`.
    ///
    /// Sets:
    /// - `dispatcher`: dispatcher name
    DispatcherStopped,

    /// The dispatch loop task ended abnormally while being joined on stop.
    ///
    /// Sets:
    /// - `dispatcher`: dispatcher name
    /// - `reason`: join failure description
    TeardownFailed,

    // === Dispatch ===
    /// Outstanding work reached the worker ceiling; dispatch waits for a unit to finish.
    ///
    /// Sets:
    /// - `dispatcher`: dispatcher name
    /// - `workers`: ceiling in effect
    PoolSaturated,

    /// A dequeued event had no handlers registered at dispatch time.
    ///
    /// Sets:
    /// - `dispatcher`: dispatcher name
    /// - `event_type`: routing key of the event
    EventUnrouted,

    /// A handler returned an error.
    ///
    /// Sets:
    /// - `dispatcher`: dispatcher name
    /// - `event_type`: routing key of the event
    /// - `handler`: handler name
    /// - `reason`: error message
    HandlerFailed,

    /// A handler panicked.
    ///
    /// Sets:
    /// - `dispatcher`: dispatcher name
    /// - `event_type`: routing key of the event
    /// - `handler`: handler name
    /// - `reason`: panic info
    HandlerPanicked,

    // === Observers ===
    /// An observer dropped a notice (queue full or worker closed).
    ///
    /// Sets:
    /// - `handler`: observer name
    /// - `reason`: "full" or "closed"
    ObserverOverflow,

    /// An observer panicked while processing a notice.
    ///
    /// Sets:
    /// - `handler`: observer name
    /// - `reason`: panic info
    ObserverPanicked,
}

/// Runtime notice with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`NoticeKind`]
#[derive(Clone, Debug)]
pub struct Notice {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notice classification.
    pub kind: NoticeKind,
    /// Name of the dispatcher that emitted the notice.
    pub dispatcher: Option<Arc<str>>,
    /// Routing key of the event involved, if any.
    pub event_type: Option<Arc<str>>,
    /// Handler (or observer) name, if any.
    pub handler: Option<Arc<str>>,
    /// Human-readable reason (errors, panic info, overflow details).
    pub reason: Option<Arc<str>>,
    /// Worker pool size or ceiling, if applicable.
    pub workers: Option<u32>,
}

impl Notice {
    /// Creates a new notice of the given kind with current timestamp and next sequence number.
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            seq: NOTICE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            dispatcher: None,
            event_type: None,
            handler: None,
            reason: None,
            workers: None,
        }
    }

    /// Attaches the emitting dispatcher name.
    #[inline]
    pub fn with_dispatcher(mut self, name: impl Into<Arc<str>>) -> Self {
        self.dispatcher = Some(name.into());
        self
    }

    /// Attaches an event type.
    #[inline]
    pub fn with_event_type(mut self, event_type: impl Into<Arc<str>>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Attaches a handler or observer name.
    #[inline]
    pub fn with_handler(mut self, handler: impl Into<Arc<str>>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a worker count (saturating at `u32::MAX`).
    #[inline]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Creates an observer overflow notice.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Notice::new(NoticeKind::ObserverOverflow)
            .with_handler(observer)
            .with_reason(reason)
    }

    /// Creates an observer panic notice.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Notice::new(NoticeKind::ObserverPanicked)
            .with_handler(observer)
            .with_reason(info)
    }

    #[inline]
    pub fn is_observer_overflow(&self) -> bool {
        matches!(self.kind, NoticeKind::ObserverOverflow)
    }

    #[inline]
    pub fn is_handler_fault(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::HandlerFailed | NoticeKind::HandlerPanicked
        )
    }
}
