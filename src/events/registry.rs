//! Listener registry.
//!
//! Maps event types to ordered lists of callbacks. Insertion order is
//! invocation order, and the same callback may be registered more than once.
//!
//! Dispatch snapshots the list before invoking anything, so a callback may
//! register, unregister or send without deadlocking. A panicking callback is
//! logged and skipped; the rest of the list still runs.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, trace, warn};

use crate::error::Error;

// ============================================================================
// Types
// ============================================================================

/// Subscriber callback. Receives the opaque event payload.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Map of event types to listeners in insertion order.
type ListenerMap = FxHashMap<String, Vec<Listener>>;

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Thread-safe event type to listener mapping.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<Mutex<ListenerMap>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        let counts: FxHashMap<&str, usize> = listeners
            .iter()
            .map(|(event, list)| (event.as_str(), list.len()))
            .collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to the listeners for `event`.
    pub fn on<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_shared(event, Arc::new(callback))
    }

    /// Appends an existing listener handle.
    ///
    /// Registering the same handle twice yields two invocations per event.
    pub fn on_shared(&self, event: &str, listener: Listener) -> Subscription {
        self.listeners
            .lock()
            .entry(event.to_owned())
            .or_default()
            .push(Arc::clone(&listener));

        trace!(event, "Listener registered");

        Subscription {
            registry: Arc::downgrade(&self.listeners),
            event: event.to_owned(),
            listener,
        }
    }

    /// Appends a callback receiving the payload deserialized as `T`.
    ///
    /// Payloads of a different shape are logged and skipped.
    pub fn on_typed<T, F>(&self, event: &str, callback: F) -> Subscription
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let name = event.to_owned();
        self.on(event, move |payload| {
            match T::deserialize(payload) {
                Ok(value) => callback(value),
                Err(e) => warn!(event = %name, error = %e, "Payload did not match listener type"),
            }
        })
    }

    /// Removes the first registration of `listener` for `event`.
    ///
    /// Matches by handle identity. Returns `false` if nothing was removed.
    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        remove_listener(&mut self.listeners.lock(), event, listener)
    }

    /// Removes every listener for `event`.
    pub fn remove_all(&self, event: &str) {
        self.listeners.lock().remove(event);
    }

    /// Removes every listener for every event.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    /// Returns the number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Returns `true` if no listeners are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().values().all(Vec::is_empty)
    }

    /// Invokes every listener for `event` in insertion order.
    ///
    /// Returns the number of listeners that completed without panicking.
    /// An event with no listeners is a no-op.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        let snapshot: Vec<Listener> = match self.listeners.lock().get(event) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut completed = 0;
        for listener in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(payload))) {
                Ok(()) => completed += 1,
                Err(panic) => {
                    let err = Error::listener_panicked(event, panic_message(panic.as_ref()));
                    error!(error = %err, "Listener callback failed");
                }
            }
        }

        completed
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle for one registration, returned by [`ListenerRegistry::on`].
///
/// Dropping it keeps the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
pub struct Subscription {
    registry: Weak<Mutex<ListenerMap>>,
    event: String,
    listener: Listener,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Event type this registration listens to.
    #[inline]
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Listener handle, usable with [`ListenerRegistry::off`].
    #[inline]
    #[must_use]
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Removes this registration.
    ///
    /// Returns `false` if it was already removed or the registry is gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => remove_listener(&mut registry.lock(), &self.event, &self.listener),
            None => false,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Removes the first entry identical to `listener`.
fn remove_listener(map: &mut ListenerMap, event: &str, listener: &Listener) -> bool {
    let Some(list) = map.get_mut(event) else {
        return false;
    };

    let Some(index) = list.iter().position(|l| Arc::ptr_eq(l, listener)) else {
        return false;
    };

    list.remove(index);
    if list.is_empty() {
        map.remove(event);
    }

    trace!(event, "Listener unregistered");
    true
}

/// Extracts a readable message from a panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::Deserialize;
    use serde_json::json;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        let listener: Listener = Arc::new(move |_| {
            handle.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    #[test]
    fn test_dispatch_in_insertion_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            registry.on("goal_updated", move |_| order.lock().push(tag));
        }

        assert_eq!(registry.dispatch("goal_updated", &json!({})), 3);
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dispatch_without_listeners_is_noop() {
        let registry = ListenerRegistry::new();
        assert_eq!(registry.dispatch("nobody_listens", &json!(1)), 0);
    }

    #[test]
    fn test_same_listener_twice_runs_twice() {
        let registry = ListenerRegistry::new();
        let (count, listener) = counter();

        registry.on_shared("x", Arc::clone(&listener));
        registry.on_shared("x", listener);
        registry.dispatch("x", &Value::Null);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_off_removes_first_match_only() {
        let registry = ListenerRegistry::new();
        let (count, listener) = counter();

        registry.on_shared("x", Arc::clone(&listener));
        registry.on_shared("x", Arc::clone(&listener));

        assert!(registry.off("x", &listener));
        assert_eq!(registry.listener_count("x"), 1);

        registry.dispatch("x", &Value::Null);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_unknown_is_noop() {
        let registry = ListenerRegistry::new();
        let (_, listener) = counter();
        assert!(!registry.off("x", &listener));

        registry.on("x", |_| {});
        assert!(!registry.off("x", &listener));
        assert_eq!(registry.listener_count("x"), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = ListenerRegistry::new();
        let (count, listener) = counter();

        let subscription = registry.on_shared("x", listener);
        assert_eq!(subscription.event(), "x");
        assert!(subscription.unsubscribe());

        registry.dispatch("x", &Value::Null);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unsubscribe_after_clear() {
        let registry = ListenerRegistry::new();
        let subscription = registry.on("x", |_| {});
        registry.clear();
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_remove_all_only_touches_one_event() {
        let registry = ListenerRegistry::new();
        registry.on("x", |_| {});
        registry.on("x", |_| {});
        registry.on("y", |_| {});

        registry.remove_all("x");
        assert_eq!(registry.listener_count("x"), 0);
        assert_eq!(registry.listener_count("y"), 1);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let registry = ListenerRegistry::new();
        let received = Arc::new(Mutex::new(None));

        registry.on("x", |_| panic!("listener exploded"));
        let sink = Arc::clone(&received);
        registry.on("x", move |payload| *sink.lock() = Some(payload.clone()));

        let completed = registry.dispatch("x", &json!({"amount": 12}));
        assert_eq!(completed, 1);
        assert_eq!(*received.lock(), Some(json!({"amount": 12})));
    }

    #[test]
    fn test_listener_may_mutate_registry_during_dispatch() {
        let registry = ListenerRegistry::new();
        let inner = registry.clone();
        registry.on("x", move |_| {
            inner.on("y", |_| {});
            inner.remove_all("x");
        });

        assert_eq!(registry.dispatch("x", &Value::Null), 1);
        assert_eq!(registry.listener_count("x"), 0);
        assert_eq!(registry.listener_count("y"), 1);
    }

    #[test]
    fn test_on_typed() {
        #[derive(Deserialize)]
        struct Balance {
            amount: i64,
        }

        let registry = ListenerRegistry::new();
        let total = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&total);
        registry.on_typed("balance", move |b: Balance| {
            sink.fetch_add(b.amount as usize, Ordering::SeqCst);
        });

        registry.dispatch("balance", &json!({"amount": 40}));
        registry.dispatch("balance", &json!("not a balance"));
        registry.dispatch("balance", &json!({"amount": 2}));

        assert_eq!(total.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
