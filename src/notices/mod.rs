//! Runtime notices: types and broadcast bus.
//!
//! This module groups the notice **data model** and the **bus** used to
//! publish/subscribe to diagnostics emitted by the dispatcher, its dispatch loop,
//! the worker pool and the observer workers.
//!
//! ## Contents
//! - [`NoticeKind`], [`Notice`] notice classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Dispatcher` (start/stop), dispatch loop (unrouted events,
//!   pool saturation), worker units (handler faults), `ObserverSet` workers
//!   (overflow/panic).
//! - **Consumers**: the observer listener spawned by `DispatcherBuilder::build`
//!   and any receiver obtained through `Dispatcher::notices()`.

mod bus;
mod notice;

pub use bus::Bus;
pub use notice::{Notice, NoticeKind};
