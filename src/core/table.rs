//! # Subscription table: event type → ordered handler list.
//!
//! ## Rules
//! - Insertion order is invocation (submission) order for an event type.
//! - Duplicates are allowed; each registration is an independent invocation.
//! - All reads and writes go through one `RwLock`; a reader never observes a
//!   partially appended list. No user code runs while the lock is held.
//! - [`SubscriptionTable::snapshot`] returns a copy; it does not track later writes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::handlers::Handler;

/// Result of a `subscribe` call.
///
/// `subscribe` never fails with an error value; internal faults are reported
/// through `success = false` and a descriptive `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOutcome {
    /// Whether the handler was registered.
    pub success: bool,
    /// Human-readable description.
    pub message: String,
}

impl SubscribeOutcome {
    pub(crate) fn succeeded(event_type: &str) -> Self {
        Self {
            success: true,
            message: format!("Successfully subscribed to event: {event_type}"),
        }
    }

    pub(crate) fn failed(event_type: &str, err: impl fmt::Display) -> Self {
        Self {
            success: false,
            message: format!("Failed to subscribe to event: {event_type}. Error: {err}"),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Thread-safe mapping from event type to handlers.
#[derive(Default)]
pub(crate) struct SubscriptionTable {
    inner: RwLock<HashMap<String, Vec<Handler>>>,
}

impl SubscriptionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `event_type`, creating the list if absent.
    pub(crate) fn subscribe(&self, event_type: &str, handler: Handler) -> SubscribeOutcome {
        if event_type.is_empty() {
            return SubscribeOutcome::failed(event_type, "event type must not be empty");
        }
        match self.inner.write() {
            Ok(mut map) => {
                map.entry(event_type.to_string()).or_default().push(handler);
                SubscribeOutcome::succeeded(event_type)
            }
            Err(poisoned) => SubscribeOutcome::failed(event_type, poisoned),
        }
    }

    /// Returns a copy of the whole table.
    pub(crate) fn snapshot(&self) -> HashMap<String, Vec<Handler>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns a copy of the handlers currently registered for `event_type`.
    pub(crate) fn handlers_for(&self, event_type: &str) -> Vec<Handler> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn has_handlers(&self, event_type: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .is_some_and(|hs| !hs.is_empty())
    }

    /// Returns `(distinct event types, total handler registrations)`.
    pub(crate) fn shape(&self) -> (usize, usize) {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (map.len(), map.values().map(Vec::len).sum())
    }

    pub(crate) fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::HandlerError;
    use crate::handlers::Payload;

    fn handler(name: &'static str) -> Handler {
        Handler::new_sync(name, |_p: Payload| Ok::<(), HandlerError>(()))
    }

    #[test]
    fn test_registration_order_and_duplicates_are_kept() {
        let table = SubscriptionTable::new();
        let h1 = handler("h1");
        let h2 = handler("h2");

        assert!(table.subscribe("evt.a", h1.clone()).is_success());
        assert!(table.subscribe("evt.a", h2.clone()).is_success());
        assert!(table.subscribe("evt.a", h1.clone()).is_success());
        assert!(table.subscribe("evt.b", h2.clone()).is_success());

        let snap = table.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap["evt.a"], vec![h1.clone(), h2.clone(), h1]);
        assert_eq!(snap["evt.b"], vec![h2]);
        assert_eq!(table.shape(), (2, 4));
    }

    #[test]
    fn test_outcome_messages() {
        let table = SubscriptionTable::new();
        let ok = table.subscribe("evt.a", handler("h"));
        assert_eq!(
            ok,
            SubscribeOutcome {
                success: true,
                message: "Successfully subscribed to event: evt.a".into()
            }
        );

        let empty = table.subscribe("", handler("h"));
        assert!(!empty.success);
        assert_eq!(
            empty.message,
            "Failed to subscribe to event: . Error: event type must not be empty"
        );
        assert_eq!(table.shape(), (1, 1));
    }

    #[test]
    fn test_event_types_are_case_sensitive() {
        let table = SubscriptionTable::new();
        table.subscribe("Evt", handler("h"));
        assert!(table.has_handlers("Evt"));
        assert!(!table.has_handlers("evt"));
        assert!(table.handlers_for("evt").is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let table = SubscriptionTable::new();
        table.subscribe("evt.a", handler("h1"));
        let snap = table.snapshot();
        table.subscribe("evt.a", handler("h2"));
        assert_eq!(snap["evt.a"].len(), 1);
        assert_eq!(table.handlers_for("evt.a").len(), 2);
    }

    #[test]
    fn test_concurrent_subscribers_lose_nothing() {
        let table = Arc::new(SubscriptionTable::new());
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let table = table.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let ty = if i % 2 == 0 { "even" } else { "odd" };
                        assert!(table.subscribe(ty, handler("h")).is_success());
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(table.shape(), (2, 400));
    }

    #[test]
    fn test_clear_empties_table() {
        let table = SubscriptionTable::new();
        table.subscribe("evt.a", handler("h"));
        table.clear();
        assert!(table.snapshot().is_empty());
        assert_eq!(table.shape(), (0, 0));
    }
}
