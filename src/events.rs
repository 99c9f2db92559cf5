//! Session lifecycle notifications
//!
//! Listeners register with [`SessionEvents`] and are called synchronously, in
//! registration order, when an event is emitted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stored credential was rejected by the server and has been removed
    Invalidated,
}

/// Receiver of session events
pub trait SessionObserver: Send + Sync {
    fn on_session_event(&self, event: SessionEvent);
}

impl<F> SessionObserver for F
where
    F: Fn(SessionEvent) + Send + Sync,
{
    fn on_session_event(&self, event: SessionEvent) {
        self(event)
    }
}

/// Handle returned by [`SessionEvents::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Thread-safe observer registry, cloned handles share the same listeners
#[derive(Clone, Default)]
pub struct SessionEvents {
    observers: Arc<RwLock<Vec<(SubscriptionId, Arc<dyn SessionObserver>)>>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: impl SessionObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: Arc<dyn SessionObserver> = Arc::new(observer);
        match self.observers.write() {
            Ok(mut guard) => guard.push((id, observer)),
            Err(_) => warn!("session observer registry is poisoned, listener dropped"),
        }
        id
    }

    /// Returns false if the id was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut guard) = self.observers.write() else {
            return false;
        };
        let before = guard.len();
        guard.retain(|(existing, _)| *existing != id);
        guard.len() != before
    }

    pub fn emit(&self, event: SessionEvent) {
        // Snapshot so observers may subscribe/unsubscribe from inside a callback
        let observers: Vec<Arc<dyn SessionObserver>> = match self.observers.read() {
            Ok(guard) => guard.iter().map(|(_, o)| Arc::clone(o)).collect(),
            Err(_) => return,
        };

        for observer in observers {
            observer.on_session_event(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.observers.read().map(|g| g.len()).unwrap_or(0)
    }
}
