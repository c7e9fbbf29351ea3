//! Listener registry and disposable subscription handles.
//!
//! Every `on_*` method in this workspace returns a [`Subscription`]. Dropping
//! it (or calling [`Subscription::unsubscribe`]) removes the listener.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Lock a mutex, recovering the data if a listener panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: BTreeMap<u64, Listener<T>>,
}

/// Ordered set of listeners for one event type.
///
/// `emit` snapshots the listener list and releases its lock before calling
/// out, so listeners may subscribe, unsubscribe or emit again reentrantly.
pub struct EventEmitter<T> {
    listeners: Arc<Mutex<Listeners<T>>>,
}

impl<T: 'static> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 1,
                entries: BTreeMap::new(),
            })),
        }
    }

    /// Register a listener. It stays registered until the returned handle is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut listeners = lock(&self.listeners);
            let id = listeners.next_id;
            listeners.next_id = listeners.next_id.saturating_add(1);
            listeners.entries.insert(id, Arc::new(listener));
            id
        };

        let registry: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).entries.remove(&id);
            }
        })
    }

    /// Call every registered listener in registration order.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Listener<T>> = lock(&self.listeners).entries.values().cloned().collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }

    /// Drop every listener. Outstanding subscriptions become no-ops.
    pub fn clear(&self) {
        lock(&self.listeners).entries.clear();
    }
}

impl<T: 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &lock(&self.listeners).entries.len())
            .finish()
    }
}

/// Handle to a registered listener.
///
/// The unsubscribe action runs exactly once: on [`unsubscribe`](Self::unsubscribe)
/// or on drop, whichever comes first. [`detach`](Self::detach) keeps the
/// listener registered for the lifetime of its source.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap an arbitrary unsubscribe action.
    pub fn new<F>(unsubscribe: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
