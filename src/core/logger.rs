//! Logger node
//!
//! A [`Logger`] is a named node in a [`Hierarchy`](crate::core::Hierarchy).
//! It owns an optional explicit level, an additivity flag and the appenders
//! attached directly to it. Level resolution and appender dispatch walk the
//! parent chain up to the root.

use super::appender::{Appender, AppenderList};
use super::builder::EventBuilder;
use super::event::{LoggingEvent, Message};
use super::hierarchy::RepositoryState;
use super::internal_log;
use super::level::Level;
use super::location::LocationInfo;
use super::log_context::LogContext;
use super::renderer::LogObject;
use super::throwable::ThrowableInformation;
use parking_lot::RwLock;
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Name of the root logger
pub const ROOT_LOGGER_NAME: &str = "root";

/// Creates logger nodes for a hierarchy
///
/// Frameworks layering extra per-logger state install a custom factory and
/// attach that state with [`Logger::with_extension`].
pub trait LoggerFactory: Send + Sync {
    fn make_new_logger_instance(&self, name: &str) -> Logger;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoggerFactory;

impl LoggerFactory for DefaultLoggerFactory {
    fn make_new_logger_instance(&self, name: &str) -> Logger {
        Logger::new(name)
    }
}

impl<F> LoggerFactory for F
where
    F: Fn(&str) -> Logger + Send + Sync,
{
    fn make_new_logger_instance(&self, name: &str) -> Logger {
        self(name)
    }
}

pub struct Logger {
    name: Arc<str>,
    level: RwLock<Option<Level>>,
    additive: AtomicBool,
    appenders: AppenderList,
    parent: RwLock<Option<Arc<Logger>>>,
    repository: OnceLock<Arc<RepositoryState>>,
    extension: Option<Box<dyn Any + Send + Sync>>,
    is_root: bool,
}

impl Logger {
    /// Detached node. Loggers are normally obtained from a hierarchy.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(None),
            additive: AtomicBool::new(true),
            appenders: AppenderList::new(),
            parent: RwLock::new(None),
            repository: OnceLock::new(),
            extension: None,
            is_root: false,
        }
    }

    pub(crate) fn root(level: Level) -> Self {
        let mut root = Self::new(ROOT_LOGGER_NAME);
        root.level = RwLock::new(Some(level));
        root.is_root = true;
        root
    }

    /// Attach framework-specific state
    #[must_use]
    pub fn with_extension<T: Any + Send + Sync>(mut self, extension: T) -> Self {
        self.extension = Some(Box::new(extension));
        self
    }

    pub fn extension<T: Any>(&self) -> Option<&T> {
        self.extension.as_ref()?.downcast_ref::<T>()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub(crate) fn set_repository(&self, repository: Arc<RepositoryState>) {
        if self.repository.set(repository).is_err() {
            internal_log::warn(format_args!(
                "Logger [{}] already belongs to a repository, ignoring",
                self.name
            ));
        }
    }

    pub(crate) fn repository(&self) -> Option<&Arc<RepositoryState>> {
        self.repository.get()
    }

    /// Name of the owning hierarchy, if it has one
    pub fn repository_name(&self) -> Option<String> {
        self.repository()?.name()
    }

    pub fn parent(&self) -> Option<Arc<Logger>> {
        self.parent.read().clone()
    }

    pub(crate) fn set_parent(&self, parent: Option<Arc<Logger>>) {
        *self.parent.write() = parent;
    }

    /// Explicitly assigned level
    pub fn level(&self) -> Option<Level> {
        self.level.read().clone()
    }

    /// Assign or clear the explicit level. The root always keeps a level.
    pub fn set_level(&self, level: Option<Level>) {
        if self.is_root && level.is_none() {
            internal_log::warn("You have tried to set a null level to root, ignoring");
            return;
        }
        *self.level.write() = level.clone();
        if let Some(repository) = self.repository() {
            for listener in repository.logger_listeners() {
                listener.level_changed(self, level.as_ref());
            }
        }
    }

    /// Own level, or the nearest ancestor's
    pub fn effective_level(&self) -> Level {
        if let Some(level) = self.level() {
            return level;
        }
        let mut current = self.parent();
        while let Some(logger) = current {
            if let Some(level) = logger.level() {
                return level;
            }
            current = logger.parent();
        }
        // Only reachable for detached nodes; the root always has a level
        Level::DEBUG
    }

    pub fn additivity(&self) -> bool {
        self.additive.load(Ordering::Relaxed)
    }

    pub fn set_additivity(&self, additive: bool) {
        self.additive.store(additive, Ordering::Relaxed);
    }

    /// Whether an event at `level` would be dispatched
    pub fn is_enabled_for(&self, level: &Level) -> bool {
        if let Some(repository) = self.repository() {
            if repository.is_disabled(level.rank()) {
                return false;
            }
        }
        level.is_as_severe_as(&self.effective_level())
    }

    pub fn is_trace_enabled(&self) -> bool {
        self.is_enabled_for(&Level::TRACE)
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.is_enabled_for(&Level::DEBUG)
    }

    pub fn is_info_enabled(&self) -> bool {
        self.is_enabled_for(&Level::INFO)
    }

    pub fn is_warn_enabled(&self) -> bool {
        self.is_enabled_for(&Level::WARN)
    }

    pub fn is_error_enabled(&self) -> bool {
        self.is_enabled_for(&Level::ERROR)
    }

    pub fn is_fatal_enabled(&self) -> bool {
        self.is_enabled_for(&Level::FATAL)
    }

    // Appender management

    pub fn add_appender(&self, appender: Arc<dyn Appender>) {
        if self.appenders.add(Arc::clone(&appender)) {
            self.fire_appender_added(&appender);
        }
    }

    /// Detach without closing
    pub fn remove_appender(&self, appender: &Arc<dyn Appender>) {
        if self.appenders.remove(appender) {
            self.fire_appender_removed(appender);
        }
    }

    /// Detach without closing
    pub fn remove_appender_by_name(&self, name: &str) -> Option<Arc<dyn Appender>> {
        let removed = self.appenders.remove_by_name(name)?;
        self.fire_appender_removed(&removed);
        Some(removed)
    }

    /// Detach and close every appender
    pub fn remove_all_appenders(&self) {
        for appender in self.appenders.remove_all() {
            self.fire_appender_removed(&appender);
        }
    }

    /// Attached appenders in dispatch order
    pub fn all_appenders(&self) -> Vec<Arc<dyn Appender>> {
        self.appenders.all().to_vec()
    }

    pub fn get_appender(&self, name: &str) -> Option<Arc<dyn Appender>> {
        self.appenders.get(name)
    }

    pub fn is_attached(&self, appender: &Arc<dyn Appender>) -> bool {
        self.appenders.is_attached(appender)
    }

    /// Close attached composite appenders, leaving them attached
    pub fn close_nested_appenders(&self) {
        for appender in self.appenders.all().iter() {
            if appender.attached().is_some() {
                appender.close();
            }
        }
    }

    fn fire_appender_added(&self, appender: &Arc<dyn Appender>) {
        if let Some(repository) = self.repository() {
            for listener in repository.logger_listeners() {
                listener.appender_added(self, appender);
            }
        }
    }

    fn fire_appender_removed(&self, appender: &Arc<dyn Appender>) {
        if let Some(repository) = self.repository() {
            for listener in repository.logger_listeners() {
                listener.appender_removed(self, appender);
            }
        }
    }

    // Dispatch

    /// Send an event to the appenders of this logger and, while additivity
    /// allows, of its ancestors
    pub fn call_appenders(&self, event: &LoggingEvent) {
        let mut writes = self.appenders.append_loop(event);

        if self.additivity() {
            let mut current = self.parent();
            while let Some(logger) = current {
                writes += logger.appenders.append_loop(event);
                if !logger.additivity() {
                    break;
                }
                current = logger.parent();
            }
        }

        if writes == 0 {
            if let Some(repository) = self.repository() {
                repository.emit_no_appender_warning(self.name());
            }
        }
    }

    pub(crate) fn new_event(&self, level: Level, message: Message) -> LoggingEvent {
        let renderer = match (&message, self.repository()) {
            (Message::Object(object), Some(repository)) => {
                let object: &dyn LogObject = &**object;
                repository.renderer_for(Any::type_id(object.as_any()))
            }
            _ => None,
        };
        LoggingEvent::new(Arc::clone(&self.name), level, message).with_renderer(renderer)
    }

    /// Build and dispatch an event without checking levels
    pub fn forced_log(
        &self,
        level: Level,
        message: Message,
        location: Option<LocationInfo>,
        throwable: Option<ThrowableInformation>,
        fields: LogContext,
    ) {
        let mut event = self.new_event(level, message).with_fields(fields);
        if let Some(location) = location {
            event = event.with_location(location);
        }
        if let Some(throwable) = throwable {
            event = event.with_throwable(throwable);
        }
        self.call_appenders(&event);
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<Message>) {
        if self.is_enabled_for(&level) {
            self.forced_log(
                level,
                message.into(),
                Some(LocationInfo::caller()),
                None,
                LogContext::new(),
            );
        }
    }

    #[track_caller]
    pub fn log_with_error(
        &self,
        level: Level,
        message: impl Into<Message>,
        error: &(dyn Error + 'static),
    ) {
        if self.is_enabled_for(&level) {
            self.forced_log(
                level,
                message.into(),
                Some(LocationInfo::caller()),
                Some(ThrowableInformation::from_error(error)),
                LogContext::new(),
            );
        }
    }

    /// Log an arbitrary value, rendered through the hierarchy's renderer for
    /// its type or its `Debug` output
    #[track_caller]
    pub fn log_object<T: LogObject>(&self, level: Level, value: T) {
        if self.is_enabled_for(&level) {
            self.forced_log(
                level,
                Message::Object(Arc::new(value)),
                Some(LocationInfo::caller()),
                None,
                LogContext::new(),
            );
        }
    }

    /// Structured event builder
    ///
    /// ```
    /// use rust_logger_hierarchy::prelude::*;
    ///
    /// let hierarchy = Hierarchy::new();
    /// let logger = hierarchy.get_logger("app.http");
    /// logger.at(Level::INFO)
    ///     .field("status", 200)
    ///     .field("latency_ms", 12.5)
    ///     .log("request served");
    /// ```
    #[track_caller]
    pub fn at(&self, level: Level) -> EventBuilder<'_> {
        EventBuilder::new(self, level, LocationInfo::caller())
    }

    #[track_caller]
    #[inline]
    pub fn trace(&self, message: impl Into<Message>) {
        self.log(Level::TRACE, message);
    }

    #[track_caller]
    #[inline]
    pub fn debug(&self, message: impl Into<Message>) {
        self.log(Level::DEBUG, message);
    }

    #[track_caller]
    #[inline]
    pub fn info(&self, message: impl Into<Message>) {
        self.log(Level::INFO, message);
    }

    #[track_caller]
    #[inline]
    pub fn warn(&self, message: impl Into<Message>) {
        self.log(Level::WARN, message);
    }

    #[track_caller]
    #[inline]
    pub fn error(&self, message: impl Into<Message>) {
        self.log(Level::ERROR, message);
    }

    #[track_caller]
    #[inline]
    pub fn fatal(&self, message: impl Into<Message>) {
        self.log(Level::FATAL, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level().map(|l| l.name().to_string()))
            .field("additive", &self.additivity())
            .field("parent", &self.parent().map(|p| p.name().to_string()))
            .field("appenders", &self.appenders)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;

    fn memory(logger: &Logger, name: &str) -> crate::appenders::MemoryHandle {
        let (appender, handle) = MemoryAppender::memory(name, 100);
        logger.add_appender(appender.activated().unwrap());
        handle
    }

    #[test]
    fn test_detached_logger_defaults() {
        let logger = Logger::new("detached");
        assert_eq!(logger.level(), None);
        assert_eq!(logger.effective_level(), Level::DEBUG);
        assert!(logger.additivity());
        assert!(logger.parent().is_none());
    }

    #[test]
    fn test_effective_level_walks_parents() {
        let root = Arc::new(Logger::root(Level::WARN));
        let mid = Arc::new(Logger::new("a"));
        let leaf = Logger::new("a.b");
        mid.set_parent(Some(Arc::clone(&root)));
        leaf.set_parent(Some(Arc::clone(&mid)));

        assert_eq!(leaf.effective_level(), Level::WARN);
        mid.set_level(Some(Level::TRACE));
        assert_eq!(leaf.effective_level(), Level::TRACE);
        assert!(leaf.is_trace_enabled());
    }

    #[test]
    fn test_root_keeps_level() {
        let root = Logger::root(Level::INFO);
        root.set_level(None);
        assert_eq!(root.level(), Some(Level::INFO));
    }

    #[test]
    fn test_call_appenders_respects_additivity() {
        let root = Arc::new(Logger::root(Level::DEBUG));
        let child = Logger::new("x");
        child.set_parent(Some(Arc::clone(&root)));

        let root_handle = memory(&root, "root-mem");
        let child_handle = memory(&child, "child-mem");

        child.info("both");
        child.set_additivity(false);
        child.info("child only");

        assert_eq!(child_handle.messages(), vec!["both", "child only"]);
        assert_eq!(root_handle.messages(), vec!["both"]);
    }

    #[test]
    fn test_remove_appender_does_not_close() {
        let logger = Logger::new("x");
        let (appender, _) = MemoryAppender::memory("mem", 10);
        let appender: Arc<dyn Appender> = appender.activated().unwrap();
        logger.add_appender(Arc::clone(&appender));
        assert!(logger.is_attached(&appender));
        assert!(logger.get_appender("mem").is_some());

        logger.remove_appender(&appender);
        assert!(!appender.core().is_closed());

        logger.add_appender(Arc::clone(&appender));
        logger.remove_all_appenders();
        assert!(appender.core().is_closed());
        assert!(logger.all_appenders().is_empty());
    }

    #[test]
    fn test_log_with_error_and_location() {
        let logger = Logger::new("x");
        let handle = memory(&logger, "mem");
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");

        logger.log_with_error(Level::ERROR, "lookup failed", &err);

        let events = handle.events();
        assert_eq!(events[0].throwable().unwrap().lines()[0], "missing");
        assert!(events[0].location().unwrap().file().ends_with("logger.rs"));
    }

    #[test]
    fn test_extension_slot() {
        #[derive(Debug, PartialEq)]
        struct Owner(&'static str);

        let logger = Logger::new("ext").with_extension(Owner("billing"));
        assert_eq!(logger.extension::<Owner>(), Some(&Owner("billing")));
        assert!(logger.extension::<u32>().is_none());
    }
}
