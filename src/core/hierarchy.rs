//! Logger hierarchy
//!
//! A [`Hierarchy`] owns the name table of loggers, the root logger and the
//! repository-wide state (threshold, renderers, listeners). Loggers named
//! `a.b.c` are linked to their nearest existing ancestor; ancestors that do
//! not exist yet are remembered as provision nodes and adopt their waiting
//! descendants when they are created.
//!
//! The name table is guarded by one mutex, held only for lookup and for the
//! create-and-relink sequence. No logging happens while it is held.

use super::appender::Appender;
use super::error::{LoggerError, Result};
use super::internal_log;
use super::level::Level;
use super::listener::{HierarchyEventListener, ListenerSet, RepositoryEventListener};
use super::logger::{DefaultLoggerFactory, Logger, LoggerFactory};
use super::renderer::{ObjectRenderer, RendererMap};
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

/// State shared between a hierarchy and its loggers
pub(crate) struct RepositoryState {
    name: RwLock<Option<String>>,
    threshold: RwLock<Level>,
    threshold_rank: AtomicI32,
    renderers: RwLock<RendererMap>,
    logger_listeners: ListenerSet<dyn HierarchyEventListener>,
    emitted_no_appender_warning: AtomicBool,
}

impl RepositoryState {
    fn new(name: Option<String>) -> Self {
        Self {
            name: RwLock::new(name),
            threshold: RwLock::new(Level::ALL),
            threshold_rank: AtomicI32::new(Level::ALL.rank()),
            renderers: RwLock::new(RendererMap::new()),
            logger_listeners: ListenerSet::new("hierarchy event"),
            emitted_no_appender_warning: AtomicBool::new(false),
        }
    }

    pub(crate) fn name(&self) -> Option<String> {
        self.name.read().clone()
    }

    /// Repository-wide floor check, done before any per-logger work
    #[inline]
    pub(crate) fn is_disabled(&self, level_rank: i32) -> bool {
        self.threshold_rank.load(Ordering::Relaxed) > level_rank
    }

    fn set_threshold(&self, level: Level) {
        self.threshold_rank.store(level.rank(), Ordering::Relaxed);
        *self.threshold.write() = level;
    }

    pub(crate) fn renderer_for(&self, type_id: TypeId) -> Option<Arc<dyn ObjectRenderer>> {
        self.renderers.read().get(type_id)
    }

    pub(crate) fn logger_listeners(&self) -> Vec<Arc<dyn HierarchyEventListener>> {
        self.logger_listeners.snapshot()
    }

    pub(crate) fn emit_no_appender_warning(&self, logger_name: &str) {
        if !self.emitted_no_appender_warning.swap(true, Ordering::Relaxed) {
            internal_log::warn(format_args!(
                "No appenders could be found for logger ({}).",
                logger_name
            ));
            internal_log::warn("Please initialize the logger system properly.");
        }
    }
}

/// Slot of the name table
enum Node {
    Logger(Arc<Logger>),
    /// Descendants waiting for this ancestor to be created
    Provision(Vec<Arc<Logger>>),
}

/// Whether `name` is `ancestor` or lies below it
fn is_at_or_below(name: &str, ancestor: &str) -> bool {
    name == ancestor
        || (name.len() > ancestor.len()
            && name.starts_with(ancestor)
            && name.as_bytes()[ancestor.len()] == b'.')
}

/// Root of a logger tree plus its shared configuration
///
/// ```
/// use rust_logger_hierarchy::prelude::*;
/// use std::sync::Arc;
///
/// let hierarchy = Hierarchy::new();
/// let child = hierarchy.get_logger("com.foo.bar");
/// let parent = hierarchy.get_logger("com.foo");
///
/// assert!(Arc::ptr_eq(&child.parent().unwrap(), &parent));
/// assert!(Arc::ptr_eq(&parent.parent().unwrap(), &hierarchy.root_logger()));
/// ```
pub struct Hierarchy {
    state: Arc<RepositoryState>,
    table: Mutex<HashMap<String, Node>>,
    root: Arc<Logger>,
    factory: RwLock<Arc<dyn LoggerFactory>>,
    repository_listeners: ListenerSet<dyn RepositoryEventListener>,
    properties: RwLock<HashMap<String, String>>,
    errors: Mutex<Vec<String>>,
    shut_down: AtomicBool,
    pristine: AtomicBool,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl Hierarchy {
    /// Unnamed hierarchy with the root at DEBUG
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()))
    }

    fn build(name: Option<String>) -> Self {
        let state = Arc::new(RepositoryState::new(name));
        let root = Arc::new(Logger::root(Level::DEBUG));
        root.set_repository(Arc::clone(&state));
        Self {
            state,
            table: Mutex::new(HashMap::new()),
            root,
            factory: RwLock::new(Arc::new(DefaultLoggerFactory)),
            repository_listeners: ListenerSet::new("repository event"),
            properties: RwLock::new(HashMap::new()),
            errors: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
            pristine: AtomicBool::new(true),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.state.name()
    }

    /// Name an unnamed hierarchy. Renaming is a lifecycle error.
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let mut current = self.state.name.write();
        match current.as_deref() {
            Some(existing) if existing != name => Err(LoggerError::RepositoryRenamed {
                current: existing.to_string(),
                requested: name,
            }),
            _ => {
                *current = Some(name);
                Ok(())
            }
        }
    }

    // Logger lookup

    pub fn root_logger(&self) -> Arc<Logger> {
        Arc::clone(&self.root)
    }

    /// Lookup or create. The empty name is the root logger.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        let factory = Arc::clone(&self.factory.read());
        self.get_logger_with(name, factory.as_ref())
    }

    /// Lookup or create, building new nodes with `factory`
    pub fn get_logger_with(&self, name: &str, factory: &dyn LoggerFactory) -> Arc<Logger> {
        if name.is_empty() {
            return self.root_logger();
        }

        let mut table = self.table.lock();
        if let Some(Node::Logger(logger)) = table.get(name) {
            return Arc::clone(logger);
        }

        let logger = Arc::new(factory.make_new_logger_instance(name));
        if logger.name() != name {
            internal_log::warn(format_args!(
                "Logger factory returned [{}] for requested name [{}]",
                logger.name(),
                name
            ));
        }
        logger.set_repository(Arc::clone(&self.state));

        let previous = table.insert(name.to_string(), Node::Logger(Arc::clone(&logger)));
        if let Some(Node::Provision(waiting)) = previous {
            self.update_children(&waiting, &logger);
        }
        self.update_parents(&mut table, &logger, name);
        logger
    }

    /// Link a new logger to its nearest existing ancestor, registering it
    /// with every missing ancestor on the way
    fn update_parents(
        &self,
        table: &mut HashMap<String, Node>,
        logger: &Arc<Logger>,
        name: &str,
    ) {
        let mut end = name.len();
        while let Some(dot) = name[..end].rfind('.') {
            let prefix = &name[..dot];
            end = dot;
            if prefix.is_empty() {
                break;
            }
            match table.get_mut(prefix) {
                None => {
                    table.insert(prefix.to_string(), Node::Provision(vec![Arc::clone(logger)]));
                }
                Some(Node::Logger(parent)) => {
                    logger.set_parent(Some(Arc::clone(parent)));
                    return;
                }
                Some(Node::Provision(waiting)) => waiting.push(Arc::clone(logger)),
            }
        }
        logger.set_parent(Some(self.root_logger()));
    }

    /// Adopt the descendants that were waiting for `logger`
    ///
    /// A waiting child whose current parent already lies at or below the new
    /// logger is correctly linked to something closer and is left alone.
    fn update_children(&self, waiting: &[Arc<Logger>], logger: &Arc<Logger>) {
        for child in waiting {
            let Some(current) = child.parent() else {
                child.set_parent(Some(Arc::clone(logger)));
                continue;
            };
            let closer = !Arc::ptr_eq(&current, &self.root)
                && is_at_or_below(current.name(), logger.name());
            if !closer {
                logger.set_parent(Some(current));
                child.set_parent(Some(Arc::clone(logger)));
            }
        }
    }

    /// Lookup without creating
    pub fn exists(&self, name: &str) -> Option<Arc<Logger>> {
        match self.table.lock().get(name) {
            Some(Node::Logger(logger)) => Some(Arc::clone(logger)),
            _ => None,
        }
    }

    /// Every real logger, root excluded
    pub fn current_loggers(&self) -> Vec<Arc<Logger>> {
        self.table
            .lock()
            .values()
            .filter_map(|node| match node {
                Node::Logger(logger) => Some(Arc::clone(logger)),
                Node::Provision(_) => None,
            })
            .collect()
    }

    /// Replace the factory used by [`Hierarchy::get_logger`]
    pub fn set_logger_factory(&self, factory: Arc<dyn LoggerFactory>) {
        *self.factory.write() = factory;
    }

    /// Forget every logger except the root
    ///
    /// Existing handles keep working but are no longer reachable by name.
    pub fn clear(&self) {
        self.table.lock().clear();
    }

    // Threshold

    pub fn threshold(&self) -> Level {
        self.state.threshold.read().clone()
    }

    pub fn set_threshold(&self, level: Level) {
        self.state.set_threshold(level);
    }

    /// Set the threshold by name; unknown names are reported and ignored
    pub fn set_threshold_str(&self, name: &str) {
        match name.parse::<Level>() {
            Ok(level) => self.set_threshold(level),
            Err(_) => internal_log::warn(format_args!(
                "Could not convert [{}] to Level, threshold unchanged",
                name
            )),
        }
    }

    /// Whether events of this rank are below the repository threshold
    #[inline]
    pub fn is_disabled(&self, level_rank: i32) -> bool {
        self.state.is_disabled(level_rank)
    }

    // Renderers

    pub fn add_renderer<T: Any>(&self, renderer: impl ObjectRenderer + 'static) {
        self.state
            .renderers
            .write()
            .put(TypeId::of::<T>(), Arc::new(renderer));
    }

    pub fn add_renderer_fn<T, F>(&self, render: F)
    where
        T: Any,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.state.renderers.write().put_fn::<T, F>(render);
    }

    pub fn renderer_for(&self, type_id: TypeId) -> Option<Arc<dyn ObjectRenderer>> {
        self.state.renderer_for(type_id)
    }

    pub fn renderer_count(&self) -> usize {
        self.state.renderers.read().len()
    }

    // Listeners

    pub fn add_hierarchy_event_listener(&self, listener: Arc<dyn HierarchyEventListener>) {
        self.state.logger_listeners.add(listener);
    }

    pub fn remove_hierarchy_event_listener(&self, listener: &Arc<dyn HierarchyEventListener>) {
        self.state.logger_listeners.remove(listener);
    }

    pub fn add_repository_event_listener(&self, listener: Arc<dyn RepositoryEventListener>) {
        self.repository_listeners.add(listener);
    }

    pub fn remove_repository_event_listener(&self, listener: &Arc<dyn RepositoryEventListener>) {
        self.repository_listeners.remove(listener);
    }

    /// Notify repository listeners that a configurator applied changes
    pub fn fire_configuration_changed(&self) {
        for listener in self.repository_listeners.snapshot() {
            listener.configuration_changed(self);
        }
    }

    // Properties and error list

    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.read().get(key).cloned()
    }

    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.write().insert(key.into(), value.into());
    }

    pub fn add_error_item(&self, message: impl Into<String>) {
        self.errors.lock().push(message.into());
    }

    /// Configuration errors recorded so far
    pub fn error_list(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn is_pristine(&self) -> bool {
        self.pristine.load(Ordering::Relaxed)
    }

    pub fn set_pristine(&self, pristine: bool) {
        self.pristine.store(pristine, Ordering::Relaxed);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    // Lifecycle

    /// Restore the default configuration
    ///
    /// Appenders are closed and detached, explicit levels cleared (root back
    /// to DEBUG), additivity restored, renderers dropped and the threshold
    /// reset to ALL. Log calls running concurrently may observe a partially
    /// reset tree.
    pub fn reset_configuration(&self) {
        self.root.set_level(Some(Level::DEBUG));
        self.set_threshold(Level::ALL);

        self.close_all_appenders();

        for logger in self.current_loggers() {
            logger.set_level(None);
            logger.set_additivity(true);
        }
        self.root.set_additivity(true);
        self.state.renderers.write().clear();

        for listener in self.repository_listeners.snapshot() {
            listener.configuration_reset(self);
        }
    }

    /// Close every appender, notify listeners and mark the hierarchy inert
    ///
    /// Loggers can still be obtained afterwards, but have no appenders.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        internal_log::debug("Shutting down logger hierarchy");
        self.close_all_appenders();
        for listener in self.repository_listeners.snapshot() {
            listener.shutdown(self);
        }
    }

    /// Composites first, so they never forward into closed children
    fn close_all_appenders(&self) {
        let loggers = self.current_loggers();

        self.root.close_nested_appenders();
        for logger in &loggers {
            logger.close_nested_appenders();
        }

        self.root.remove_all_appenders();
        for logger in &loggers {
            logger.remove_all_appenders();
        }
    }

    /// Every distinct appender attached anywhere in the tree
    pub fn all_appenders(&self) -> Vec<Arc<dyn Appender>> {
        let mut seen: Vec<Arc<dyn Appender>> = Vec::new();
        let loggers = std::iter::once(self.root_logger()).chain(self.current_loggers());
        for logger in loggers {
            for appender in logger.all_appenders() {
                if !seen
                    .iter()
                    .any(|a| std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(&appender)))
                {
                    seen.push(appender);
                }
            }
        }
        seen
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("name", &self.name())
            .field("threshold", &self.threshold().name())
            .field("loggers", &self.table.lock().len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
