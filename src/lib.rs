//! # eventvisor
//!
//! **Eventvisor** is an in-process publish/subscribe event dispatcher for tokio.
//!
//! Producers post named events; subscribers attach handlers to event types; the
//! dispatcher buffers posted events and fans each one out to every handler
//! registered for its type, running the invocations on a bounded pool of
//! concurrent work units. A quiescence barrier ([`Dispatcher::process_all_events`])
//! lets callers wait until everything posted so far has been fully handled.
//!
//! ## Architecture
//! ```text
//!   subscribe(type, Handler)            post(type, Payload)
//!            │                                  │
//!            ▼                                  ▼
//! ┌────────────────────┐   snapshot   ┌──────────────────────┐
//! │ SubscriptionTable  │◄─────────────│     EventQueue       │
//! │ type → [Handler]   │              │ (unbounded, pending) │
//! └────────────────────┘              └──────────┬───────────┘
//!                                                ▼
//!                                     ┌──────────────────────┐
//!                                     │    DispatchLoop      │
//!                                     │ one unit per handler │
//!                                     └──────────┬───────────┘
//!                                                ▼
//!                          ┌───────────────────────────────────────┐
//!                          │ WorkerPool (ceiling = worker count)   │
//!                          │  unit ─► Handler::Sync  (blocking)    │
//!                          │  unit ─► Handler::Async (awaited)     │
//!                          └──────────────────┬────────────────────┘
//!                                             │ faults
//!                                             ▼
//!                          Bus (Notice) ──► ObserverSet ──► LogWriter / custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──start()──► Running ──stop()──► Draining ──drain done──► Stopped ──start()──► Running
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types                                |
//! |-------------------|-----------------------------------------------------------|------------------------------------------|
//! | **Dispatch**      | Subscribe, post, wait for quiescence, start/stop          | [`Dispatcher`], [`LifecycleState`]       |
//! | **Handlers**      | Tagged sync/async handlers over shared payloads           | [`Handler`], [`HandlerKind`], [`Payload`]|
//! | **Errors**        | Typed errors for operations and handler faults            | [`DispatchError`], [`HandlerError`]      |
//! | **Observability** | Runtime notices fanned out to observers                   | [`Notice`], [`NoticeKind`], [`Observe`]  |
//! | **Configuration** | Instance name, bus capacity, worker cap                   | [`DispatcherConfig`]                     |
//! | **Listeners**     | Bulk registration of handler maps                         | [`Listener`]                             |
//!
//! ## Optional features
//! - `logging` (default): exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Dispatcher, DispatcherConfig, Handler, HandlerError, Payload};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::builder(DispatcherConfig::named("demo")).build();
//!
//!     dispatcher.subscribe(
//!         "evt.a",
//!         Handler::new_sync("print", |p: Payload| {
//!             println!("{:?}", p.get("dummy_data"));
//!             Ok::<_, HandlerError>(())
//!         }),
//!     );
//!
//!     dispatcher.start()?;
//!     let payload = Payload::try_from(serde_json::json!({ "dummy_data": "x" }))?;
//!     dispatcher.post("evt.a", payload)?;
//!     dispatcher.process_all_events().await;
//!     dispatcher.stop().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod handlers;
mod listener;
mod notices;
mod observers;

// ---- Public re-exports ----

pub use core::{Dispatcher, DispatcherBuilder, DispatcherConfig, LifecycleState, SubscribeOutcome};
pub use error::{DispatchError, HandlerError};
pub use handlers::{BoxHandlerFuture, Handler, HandlerKind, Payload};
pub use listener::Listener;
pub use notices::{Notice, NoticeKind};
pub use observers::Observe;

// Optional: expose a simple built-in notice writer (demo/reference).
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use observers::LogWriter;
