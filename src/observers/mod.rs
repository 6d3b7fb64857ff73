//! # Notice observers for the eventvisor dispatcher.
//!
//! This module provides the [`Observe`] trait, the `ObserverSet` fan-out and
//! the built-in [`LogWriter`] for consuming [`Notice`](crate::Notice)s broadcast
//! through the [`Bus`](crate::notices::Bus).
//!
//! ## Architecture
//! ```text
//! Dispatcher / dispatch loop / worker units ── publish(Notice) ──► Bus
//!                                                                   │
//!                                                          observer listener
//!                                                                   │
//!                                                       ObserverSet::emit(&Notice)
//!                                                   ┌───────────────┼───────────────┐
//!                                                   ▼               ▼               ▼
//!                                              [queue 1]       [queue 2]  ...  [queue N]
//!                                                   │               │               │
//!                                              LogWriter        Metrics          Custom
//! ```

mod observe;
mod observer_set;

#[cfg(feature = "logging")]
mod log;

pub use observe::Observe;
pub(crate) use observer_set::ObserverSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
