//! Synchronous fan-out appender
//!
//! Groups several appenders behind one name and one threshold/filter chain,
//! forwarding each accepted event to every child on the calling thread.

use crate::core::appender::{Appender, AppenderCore, AppenderList};
use crate::core::error::{LoggerError, Result};
use crate::core::event::LoggingEvent;
use crate::core::level::Level;
use crate::core::filter::Filter;
use std::fmt;
use std::sync::Arc;

/// Composite appender dispatching to its children in attachment order
///
/// ```
/// use rust_logger_hierarchy::prelude::*;
/// use rust_logger_hierarchy::appenders::HubAppender;
///
/// let (first, first_handle) = MemoryAppender::memory("first", 10);
/// let (second, second_handle) = MemoryAppender::memory("second", 10);
///
/// let hub = HubAppender::new("hub").with_threshold(Level::WARN);
/// hub.add_appender(first.activated().unwrap());
/// hub.add_appender(second.activated().unwrap());
/// let hub = hub.activated().unwrap();
///
/// hub.do_append(&LoggingEvent::new("app", Level::ERROR, "disk full"));
/// hub.do_append(&LoggingEvent::new("app", Level::INFO, "ignored"));
/// assert_eq!(first_handle.len(), 1);
/// assert_eq!(second_handle.len(), 1);
/// ```
pub struct HubAppender {
    core: AppenderCore,
    children: AppenderList,
}

impl HubAppender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: AppenderCore::new(name),
            children: AppenderList::new(),
        }
    }

    #[must_use]
    pub fn with_threshold(self, threshold: Level) -> Self {
        self.core.set_threshold(threshold);
        self
    }

    #[must_use]
    pub fn with_filter(self, filter: impl Filter + 'static) -> Self {
        self.core.add_filter(Arc::new(filter));
        self
    }

    pub fn add_appender(&self, appender: Arc<dyn Appender>) -> bool {
        self.children.add(appender)
    }

    pub fn remove_appender(&self, appender: &Arc<dyn Appender>) -> bool {
        self.children.remove(appender)
    }

    pub fn activated(self) -> Result<Arc<Self>> {
        self.activate_options()?;
        Ok(Arc::new(self))
    }
}

impl Appender for HubAppender {
    fn core(&self) -> &AppenderCore {
        &self.core
    }

    fn append(&self, event: &LoggingEvent) -> Result<()> {
        self.children.append_loop(event);
        Ok(())
    }

    fn activate_options(&self) -> Result<()> {
        if self.core.is_closed() {
            return Err(LoggerError::appender_closed(self.core.name()));
        }
        self.core.mark_active()
    }

    fn close(&self) {
        if !self.core.mark_closed() {
            return;
        }
        for child in self.children.all().iter() {
            child.close();
        }
    }

    fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for child in self.children.all().iter() {
            if let Err(e) = child.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn attached(&self) -> Option<&AppenderList> {
        Some(&self.children)
    }
}

impl fmt::Debug for HubAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubAppender")
            .field("core", &self.core)
            .field("children", &self.children)
            .finish()
    }
}
