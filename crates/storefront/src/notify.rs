//! Typed change notifications for store consumers.
//!
//! The pages used to rely on a single global DOM event name to keep the
//! favorites listing and the card badges in sync. That is formalized here
//! as a per-store subscription list: any consumer (badge, listing page)
//! registers a callback and the store invokes it after every successful
//! mutation, instead of polling or holding its own copy of the data.

use std::sync::{Arc, Mutex};

use tracing::warn;

/// A registered observer callback.
type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Subscription list for events of type `E`.
///
/// Callbacks run synchronously, in registration order, on the mutating
/// call's thread. The list is cloned out before invocation, so callbacks
/// may subscribe or mutate stores without deadlocking.
pub struct Subscribers<E> {
    callbacks: Mutex<Vec<Callback<E>>>,
}

impl<E> Subscribers<E> {
    pub(crate) fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback for every future event.
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) {
        let Ok(mut callbacks) = self.callbacks.lock() else {
            warn!("subscriber list poisoned, dropping subscription");
            return;
        };
        callbacks.push(Arc::new(callback));
    }

    /// Invoke all callbacks with `event`.
    pub(crate) fn notify(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = {
            let Ok(callbacks) = self.callbacks.lock() else {
                warn!("subscriber list poisoned, dropping notification");
                return;
            };
            callbacks.clone()
        };
        for callback in callbacks {
            callback(event);
        }
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}
