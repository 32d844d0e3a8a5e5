//! Explicit observer lists used for event fan-out.
//!
//! An [`EventHub`] is owned by the entity that raises the event. Aggregates
//! subscribe to a child's hub when they initialize the child and
//! unsubscribe with the returned [`ListenerId`] when they tear it down, so no
//! listener outlives the aggregate's initialized period.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Identifies one subscription on one hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct HubInner<T> {
    listeners: RwLock<Vec<(ListenerId, Listener<T>)>>,
    next_id: AtomicU64,
}

/// Cloneable handle to a list of listeners for events of type `T`.
///
/// Clones share the same listener list.
pub struct EventHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> EventHub<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register a listener; keep the id to unsubscribe later.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let listener: Listener<T> = Arc::new(listener);
        self.inner.listeners.write().push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Deliver `event` to every listener in subscription order.
    ///
    /// Listeners run on a snapshot, so they may subscribe or unsubscribe
    /// while being notified.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Listener<T>> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    pub fn clear(&self) {
        self.inner.listeners.write().clear();
    }
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
