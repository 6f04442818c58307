//! Repository selection and the process-wide facade
//!
//! [`LogManager`] hands out loggers from the hierarchy chosen by the
//! installed [`RepositorySelector`]. The selector can be installed once; the
//! first use without an explicit install installs the default one.

use super::error::{LoggerError, Result};
use super::hierarchy::Hierarchy;
use super::internal_log;
use super::logger::Logger;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Picks the hierarchy a caller should log into
pub trait RepositorySelector: Send + Sync {
    /// The default repository
    fn repository(&self) -> Arc<Hierarchy>;

    /// Repository for a caller context, such as an application or tenant
    /// name. Defaults to the default repository.
    fn repository_for(&self, _context: &str) -> Arc<Hierarchy> {
        self.repository()
    }
}

/// Always selects the same hierarchy
#[derive(Debug)]
pub struct DefaultRepositorySelector {
    repository: Arc<Hierarchy>,
}

impl DefaultRepositorySelector {
    pub fn new(repository: Arc<Hierarchy>) -> Self {
        Self { repository }
    }
}

impl Default for DefaultRepositorySelector {
    fn default() -> Self {
        Self::new(Arc::new(Hierarchy::new()))
    }
}

impl RepositorySelector for DefaultRepositorySelector {
    fn repository(&self) -> Arc<Hierarchy> {
        Arc::clone(&self.repository)
    }
}

/// One named hierarchy per context string, created on first use
///
/// ```
/// use rust_logger_hierarchy::core::{ContextRepositorySelector, RepositorySelector};
/// use std::sync::Arc;
///
/// let selector = ContextRepositorySelector::new();
/// let billing = selector.repository_for("billing");
/// assert_eq!(billing.name().as_deref(), Some("billing"));
/// assert!(Arc::ptr_eq(&billing, &selector.repository_for("billing")));
/// assert!(!Arc::ptr_eq(&billing, &selector.repository_for("search")));
/// ```
#[derive(Debug)]
pub struct ContextRepositorySelector {
    default: Arc<Hierarchy>,
    contexts: Mutex<HashMap<String, Arc<Hierarchy>>>,
}

impl Default for ContextRepositorySelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextRepositorySelector {
    pub fn new() -> Self {
        Self {
            default: Arc::new(Hierarchy::new()),
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Forget a context, shutting its hierarchy down
    pub fn remove(&self, context: &str) -> Option<Arc<Hierarchy>> {
        let removed = self.contexts.lock().remove(context)?;
        removed.shutdown();
        Some(removed)
    }

    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().keys().cloned().collect()
    }
}

impl RepositorySelector for ContextRepositorySelector {
    fn repository(&self) -> Arc<Hierarchy> {
        Arc::clone(&self.default)
    }

    fn repository_for(&self, context: &str) -> Arc<Hierarchy> {
        if context.is_empty() {
            return self.repository();
        }
        let mut contexts = self.contexts.lock();
        let repository = contexts
            .entry(context.to_string())
            .or_insert_with(|| Arc::new(Hierarchy::named(context)));
        Arc::clone(repository)
    }
}

static SELECTOR: OnceLock<Box<dyn RepositorySelector>> = OnceLock::new();

/// Process-wide entry point
///
/// ```
/// use rust_logger_hierarchy::core::LogManager;
///
/// let logger = LogManager::get_logger("com.example.service");
/// logger.info("started");
/// assert!(LogManager::exists("com.example.service").is_some());
/// ```
pub struct LogManager;

impl LogManager {
    /// Install the selector. Fails if one is already in place, including the
    /// default one installed by an earlier lookup.
    pub fn set_repository_selector(selector: impl RepositorySelector + 'static) -> Result<()> {
        SELECTOR
            .set(Box::new(selector))
            .map_err(|_| LoggerError::SelectorAlreadySet)
    }

    fn selector() -> &'static dyn RepositorySelector {
        SELECTOR
            .get_or_init(|| {
                internal_log::debug("Installing the default repository selector");
                Box::new(DefaultRepositorySelector::default())
            })
            .as_ref()
    }

    pub fn repository() -> Arc<Hierarchy> {
        Self::selector().repository()
    }

    pub fn repository_for(context: &str) -> Arc<Hierarchy> {
        Self::selector().repository_for(context)
    }

    pub fn get_logger(name: &str) -> Arc<Logger> {
        Self::repository().get_logger(name)
    }

    pub fn root_logger() -> Arc<Logger> {
        Self::repository().root_logger()
    }

    pub fn exists(name: &str) -> Option<Arc<Logger>> {
        Self::repository().exists(name)
    }

    pub fn current_loggers() -> Vec<Arc<Logger>> {
        Self::repository().current_loggers()
    }

    pub fn reset_configuration() {
        Self::repository().reset_configuration();
    }

    pub fn shutdown() {
        Self::repository().shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selector_is_stable() {
        let selector = DefaultRepositorySelector::default();
        assert!(Arc::ptr_eq(&selector.repository(), &selector.repository()));
        assert!(Arc::ptr_eq(
            &selector.repository(),
            &selector.repository_for("anything")
        ));
    }

    #[test]
    fn test_context_selector_remove_shuts_down() {
        let selector = ContextRepositorySelector::new();
        let tenant = selector.repository_for("tenant-a");
        assert_eq!(selector.contexts(), vec!["tenant-a".to_string()]);
        assert!(Arc::ptr_eq(&selector.repository_for(""), &selector.repository()));

        let removed = selector.remove("tenant-a").unwrap();
        assert!(Arc::ptr_eq(&removed, &tenant));
        assert!(tenant.is_shut_down());
        assert!(selector.remove("tenant-a").is_none());
    }
}
