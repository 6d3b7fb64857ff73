//! # Core observer trait
//!
//! `Observe` is the extension point for plugging logging, metrics or alerting into
//! the dispatcher. Each observer is driven by a dedicated worker loop fed by a
//! bounded queue owned by the dispatcher's observer set.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   dispatcher nor other observers.
//! - Each observer **declares** its preferred queue capacity via
//!   [`Observe::queue_capacity`]. If a queue overflows, notices for that
//!   observer are **dropped**.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Notice, NoticeKind, Observe};
//! use async_trait::async_trait;
//!
//! struct FaultCounter;
//!
//! #[async_trait]
//! impl Observe for FaultCounter {
//!     async fn on_notice(&self, notice: &Notice) {
//!         if notice.kind == NoticeKind::HandlerFailed {
//!             // increment a counter...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "fault-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::notices::Notice;

/// Contract for notice observers.
///
/// Called from an observer-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handle a single notice for this observer.
    async fn on_notice(&self, notice: &Notice);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
