//! # Dispatcher configuration.
//!
//! Provides [`DispatcherConfig`] centralized settings for one dispatcher instance.
//!
//! ## Sentinel values
//! - `max_workers = 0` → no cap on the computed worker count
//! - `bus_capacity = 0` → clamped to 1

use std::borrow::Cow;

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
///
/// ## Field semantics
/// - `name`: label attached to every [`Notice`](crate::Notice) the instance emits
/// - `bus_capacity`: notice bus ring buffer size (min 1)
/// - `max_workers`: upper bound on the pool size computed at start (`0` = no cap)
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Instance label used in notices and logs.
    pub name: Cow<'static, str>,

    /// Capacity of the notice bus broadcast channel.
    ///
    /// Receivers lagging more than `bus_capacity` notices skip older items.
    pub bus_capacity: usize,

    /// Upper bound on the worker count.
    ///
    /// - `0` = use the computed size as is
    /// - `n > 0` = `min(computed, n)`
    pub max_workers: usize,
}

impl DispatcherConfig {
    /// Returns a config with the given instance name and defaults otherwise.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the worker cap as an `Option`.
    #[inline]
    pub fn worker_limit(&self) -> Option<usize> {
        if self.max_workers == 0 {
            None
        } else {
            Some(self.max_workers)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for DispatcherConfig {
    /// Default configuration:
    ///
    /// - `name = "dispatcher"`
    /// - `bus_capacity = 1024`
    /// - `max_workers = 0` (no cap)
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("dispatcher"),
            bus_capacity: 1024,
            max_workers: 0,
        }
    }
}
