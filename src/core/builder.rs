use std::sync::Arc;

use crate::{
    core::{Dispatcher, DispatcherConfig},
    observers::{Observe, ObserverSet},
};

/// Builder for constructing a [`Dispatcher`] with observers attached.
pub struct DispatcherBuilder {
    cfg: DispatcherConfig,
    observers: Vec<Arc<dyn Observe>>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: DispatcherConfig) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Sets notice observers.
    ///
    /// Observers receive runtime notices (lifecycle, handler faults, saturation)
    /// through dedicated workers with bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Adds a single observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds and returns the dispatcher in the `Idle` state.
    ///
    /// # Panics
    /// Panics if observers are present and this is called outside a tokio
    /// runtime (the observer workers and listener are spawned here).
    pub fn build(self) -> Arc<Dispatcher> {
        let dispatcher = Dispatcher::new(self.cfg);
        if !self.observers.is_empty() {
            let set = ObserverSet::new(self.observers, dispatcher.bus());
            dispatcher.attach_observers(set);
        }
        Arc::new(dispatcher)
    }
}
