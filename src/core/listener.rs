//! Structural and lifecycle listeners
//!
//! [`HierarchyEventListener`] observes changes to individual loggers,
//! [`RepositoryEventListener`] observes the hierarchy as a whole. All methods
//! have empty defaults so implementors only override what they need.

use super::appender::Appender;
use super::hierarchy::Hierarchy;
use super::internal_log;
use super::level::Level;
use super::logger::Logger;
use parking_lot::RwLock;
use std::sync::Arc;

pub trait HierarchyEventListener: Send + Sync {
    fn appender_added(&self, _logger: &Logger, _appender: &Arc<dyn Appender>) {}

    fn appender_removed(&self, _logger: &Logger, _appender: &Arc<dyn Appender>) {}

    fn level_changed(&self, _logger: &Logger, _level: Option<&Level>) {}
}

pub trait RepositoryEventListener: Send + Sync {
    fn configuration_reset(&self, _repository: &Hierarchy) {}

    fn configuration_changed(&self, _repository: &Hierarchy) {}

    fn shutdown(&self, _repository: &Hierarchy) {}
}

/// Registered listeners, notified in registration order
pub(crate) struct ListenerSet<L: ?Sized> {
    kind: &'static str,
    listeners: RwLock<Vec<Arc<L>>>,
}

impl<L: ?Sized> ListenerSet<L> {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register; a listener already present is reported and ignored
    pub(crate) fn add(&self, listener: Arc<L>) {
        let mut listeners = self.listeners.write();
        if listeners
            .iter()
            .any(|l| std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(&listener)))
        {
            internal_log::warn(format_args!(
                "Ignoring attempt to add an existing {} listener",
                self.kind
            ));
            return;
        }
        listeners.push(listener);
    }

    /// Unregister; an unknown listener is reported and ignored
    pub(crate) fn remove(&self, listener: &Arc<L>) {
        let mut listeners = self.listeners.write();
        match listeners
            .iter()
            .position(|l| std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)))
        {
            Some(pos) => {
                listeners.remove(pos);
            }
            None => internal_log::warn(format_args!(
                "Ignoring attempt to remove a non-registered {} listener",
                self.kind
            )),
        }
    }

    /// Snapshot, so callbacks run without holding the lock
    pub(crate) fn snapshot(&self) -> Vec<Arc<L>> {
        self.listeners.read().clone()
    }
}
