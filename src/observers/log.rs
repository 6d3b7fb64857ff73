//! # LogWriter: simple notice printer
//!
//! A minimal observer that prints incoming [`Notice`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [started] dispatcher="orders" workers=4
//! [handler-failed] dispatcher="orders" event="order.created" handler="audit" err="disk full"
//! [pool-saturated] dispatcher="orders" workers=4
//! [stop-requested] dispatcher="orders"
//! [stopped] dispatcher="orders"
//! ```

use async_trait::async_trait;

use crate::notices::{Notice, NoticeKind};
use crate::observers::Observe;

/// Notice writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render(n: &Notice) -> String {
        let d = n.dispatcher.as_deref().unwrap_or("unknown");
        let ev = n.event_type.as_deref().unwrap_or("unknown");
        let h = n.handler.as_deref().unwrap_or("unknown");
        let reason = n.reason.as_deref().unwrap_or("unknown");
        let workers = n.workers.unwrap_or(0);
        match n.kind {
            NoticeKind::DispatcherStarted => {
                format!("[started] dispatcher={d:?} workers={workers}")
            }
            NoticeKind::StopRequested => format!("[stop-requested] dispatcher={d:?}"),
            NoticeKind::DispatcherStopped => format!("[stopped] dispatcher={d:?}"),
            NoticeKind::TeardownFailed => {
                format!("[teardown-failed] dispatcher={d:?} err={reason:?}")
            }
            NoticeKind::PoolSaturated => {
                format!("[pool-saturated] dispatcher={d:?} workers={workers}")
            }
            NoticeKind::EventUnrouted => format!("[unrouted] dispatcher={d:?} event={ev:?}"),
            NoticeKind::HandlerFailed => format!(
                "[handler-failed] dispatcher={d:?} event={ev:?} handler={h:?} err={reason:?}"
            ),
            NoticeKind::HandlerPanicked => format!(
                "[handler-panicked] dispatcher={d:?} event={ev:?} handler={h:?} info={reason:?}"
            ),
            NoticeKind::ObserverOverflow => {
                format!("[observer-overflow] observer={h} reason={reason}")
            }
            NoticeKind::ObserverPanicked => {
                format!("[observer-panicked] observer={h} info={reason}")
            }
        }
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_notice(&self, n: &Notice) {
        println!("{}", Self::render(n));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
