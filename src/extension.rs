//! Host-side listener registration.
//!
//! The host constructs its listeners once and registers them here explicitly.
//! The bus collaborator then reports subscription changes and delivers
//! messages through the registry, which routes each message to the listeners
//! whose application id matches.

use std::sync::Arc;

use tracing::debug;

use crate::listener::ApplicationMessageListener;
use crate::registry::SnapshotSet;

/// Process-wide set of application message listeners.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    listeners: SnapshotSet<dyn ApplicationMessageListener>,
}

impl ExtensionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns false if it was already registered.
    pub fn register(&self, listener: Arc<dyn ApplicationMessageListener>) -> bool {
        let inserted = self.listeners.insert(Arc::clone(&listener));
        if inserted {
            debug!(
                name = listener.name(),
                app_id = listener.app_id(),
                "registered application listener"
            );
        }
        inserted
    }

    /// Deregister a listener. Returns false if it was not registered.
    pub fn unregister(&self, listener: &Arc<dyn ApplicationMessageListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listeners interested in `app_id`.
    #[must_use]
    pub fn listeners_for(&self, app_id: &str) -> Vec<Arc<dyn ApplicationMessageListener>> {
        self.listeners
            .snapshot()
            .iter()
            .filter(|l| l.app_id() == app_id)
            .cloned()
            .collect()
    }

    /// Notify every listener that `queue_name` was bound.
    pub fn bind(&self, queue_name: &str) {
        for listener in self.listeners.snapshot().iter() {
            listener.on_bind(queue_name);
        }
    }

    /// Notify every listener that `queue_name` was unbound.
    pub fn unbind(&self, queue_name: &str) {
        for listener in self.listeners.snapshot().iter() {
            listener.on_unbind(queue_name);
        }
    }

    /// Deliver a message to the listeners registered for `app_id`.
    ///
    /// Returns how many listeners received it.
    pub fn deliver(
        &self,
        app_id: &str,
        queue_name: &str,
        content_type: &str,
        body: &[u8],
    ) -> usize {
        let mut delivered = 0;
        for listener in self.listeners.snapshot().iter() {
            if listener.app_id() != app_id {
                continue;
            }
            listener.on_receive(queue_name, content_type, body);
            delivered += 1;
        }
        if delivered == 0 {
            debug!(app_id, queue = queue_name, "no listener for application message");
        }
        delivered
    }
}
