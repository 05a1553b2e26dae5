//! Removable, re-entrant event subscriptions.
//!
//! [`EventBus`] is a cloneable handle to a shared handler list. Every
//! [`EventBus::emit`] takes a snapshot of the list under the lock, releases
//! the lock, and then calls the handlers, so a handler may subscribe or
//! unsubscribe (itself or others) while a dispatch is in progress. Changes
//! take effect on the next emit.
//!
//! For UI loops that prefer polling, [`EventBus::channel`] forwards events
//! into a crossbeam receiver that can be drained once per frame.

use crossbeam_channel::{unbounded, Receiver};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle returned by [`EventBus::subscribe`]; pass it to
/// [`EventBus::unsubscribe`] to remove the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Entry<E> {
    id: SubscriptionId,
    once: bool,
    handler: Handler<E>,
}

impl<E> Clone for Entry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            once: self.once,
            handler: Arc::clone(&self.handler),
        }
    }
}

struct Inner<E> {
    entries: Mutex<Vec<Entry<E>>>,
    next_id: AtomicU64,
}

/// Shared event bus. Clones refer to the same handler list.
pub struct EventBus<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry<E>>> {
        // A panicking handler never runs under the lock, so the list is intact.
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, once: bool, handler: Handler<E>) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries().push(Entry { id, once, handler });
        id
    }

    /// Register a handler that runs on every emit until unsubscribed.
    pub fn subscribe(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        self.insert(false, Arc::new(handler))
    }

    /// Register a handler that runs on the next emit only.
    pub fn once(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        self.insert(true, Arc::new(handler))
    }

    /// Remove a handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() < before
    }

    pub fn handler_count(&self) -> usize {
        self.entries().len()
    }

    /// Dispatch `event` to a snapshot of the current handlers.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Entry<E>> = {
            let mut entries = self.entries();
            let snapshot = entries.clone();
            entries.retain(|e| !e.once);
            snapshot
        };

        for entry in &snapshot {
            (entry.handler)(event);
        }
    }
}

impl<E: Clone + Send + 'static> EventBus<E> {
    /// Forward every event into a channel. The handler stays registered
    /// until unsubscribed; sends to a dropped receiver are discarded.
    pub fn channel(&self) -> (SubscriptionId, Receiver<E>) {
        let (tx, rx) = unbounded();
        let id = self.subscribe(move |event: &E| {
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }
}
