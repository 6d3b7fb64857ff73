//! # Bulk handler registration.
//!
//! [`Listener`] is a helper for components that own several handlers: it
//! subscribes a whole `event type → handler` mapping in one call.
//!
//! Entries with no handler (`None`) are not registered; they yield a failed
//! [`SubscribeOutcome`] carrying the [`DispatchError::InvalidHandler`] message,
//! so a component can declare optional hooks and leave some unset.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Dispatcher, DispatcherConfig, Handler, HandlerError, Listener, Payload};
//!
//! struct Emitter;
//! impl Listener for Emitter {}
//!
//! let dispatcher = Dispatcher::new(DispatcherConfig::default());
//! let on_emit = Handler::new_sync("on_emit", |_p: Payload| Ok::<_, HandlerError>(()));
//!
//! let outcomes = Emitter.setup_handlers(
//!     &dispatcher,
//!     [("emitter.emitted", Some(on_emit)), ("emitter.other", None)],
//! );
//! assert!(outcomes[0].success);
//! assert!(!outcomes[1].success);
//! assert_eq!(dispatcher.subscriptions().len(), 1);
//! ```

use crate::core::{Dispatcher, SubscribeOutcome};
use crate::error::DispatchError;
use crate::handlers::Handler;

/// Mixin for components that register a set of handlers at once.
pub trait Listener {
    /// Subscribes every `(event type, handler)` pair in iteration order.
    ///
    /// Returns one outcome per pair, in the same order.
    fn setup_handlers<I, K>(&self, dispatcher: &Dispatcher, subscriptions: I) -> Vec<SubscribeOutcome>
    where
        I: IntoIterator<Item = (K, Option<Handler>)>,
        K: AsRef<str>,
    {
        subscriptions
            .into_iter()
            .map(|(event_type, handler)| {
                let event_type = event_type.as_ref();
                match handler {
                    Some(h) => dispatcher.subscribe(event_type, h),
                    None => {
                        let err = DispatchError::InvalidHandler {
                            event_type: event_type.to_string(),
                            reason: "no handler supplied".to_string(),
                        };
                        SubscribeOutcome::failed(event_type, err)
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::core::DispatcherConfig;
    use crate::error::HandlerError;
    use crate::handlers::Payload;

    struct Component;
    impl Listener for Component {}

    #[test]
    fn test_none_entries_are_rejected_with_invalid_handler() {
        let d = Dispatcher::new(DispatcherConfig::default());
        let outcomes = Component.setup_handlers(&d, vec![("evt.a".to_string(), None)]);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].message,
            "Failed to subscribe to event: evt.a. Error: invalid handler for 'evt.a': no handler supplied"
        );
        assert!(d.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_registered_handlers_receive_posts() {
        let d = Dispatcher::new(DispatcherConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let h = {
            let hits = hits.clone();
            Handler::new_sync("count", move |_p: Payload| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok::<_, HandlerError>(())
            })
        };

        let outcomes = Component.setup_handlers(&d, [("evt.a", Some(h.clone())), ("evt.b", Some(h))]);
        assert!(outcomes.iter().all(SubscribeOutcome::is_success));

        d.start().unwrap();
        d.post("evt.a", Payload::empty()).unwrap();
        d.post("evt.b", Payload::empty()).unwrap();
        d.process_all_events().await;
        d.stop().await;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
