//! Runtime core: the concurrent dispatch engine.
//!
//! The public API from this module is [`Dispatcher`] (with its builder, config,
//! lifecycle state and subscribe outcome).
//!
//! Internal modules:
//! - [`table`]: subscription table (event type → ordered handlers);
//! - [`queue`]: unbounded event queue with a join barrier;
//! - [`barrier`]: pending counter shared by the queue and the pool;
//! - [`pool`]: worker pool sizing, back-pressure and unit execution;
//! - [`dispatch_loop`]: drains the queue and fans events out to the pool;
//! - [`dispatcher`]: lifecycle controller and public operations.
//!
//! ```text
//! subscribe() ──► SubscriptionTable ◄──────────── snapshot per event ──┐
//!                                                                      │
//! post() ──► EventQueue ──► DispatchLoop ──► WorkerPool ──► Handler::invoke()
//!               │ pending                        │ in_flight
//!               └──────── process_all_events() ──┘
//! ```

mod barrier;
mod builder;
mod config;
mod dispatch_loop;
mod dispatcher;
mod pool;
mod queue;
mod table;

pub use builder::DispatcherBuilder;
pub use config::DispatcherConfig;
pub use dispatcher::{Dispatcher, LifecycleState};
pub use table::SubscribeOutcome;
