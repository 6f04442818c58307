//! Structured event builder
//!
//! Provides a fluent API for attaching key/value fields and an error to a
//! single event. Obtained from [`Logger::at`].

use super::event::Message;
use super::level::Level;
use super::location::LocationInfo;
use super::log_context::{FieldValue, LogContext};
use super::logger::Logger;
use super::throwable::ThrowableInformation;
use std::error::Error;

/// Builder for one structured event
///
/// Nothing is captured or formatted when the logger is not enabled for the
/// level; [`EventBuilder::log`] then does nothing.
///
/// # Example
///
/// ```
/// use rust_logger_hierarchy::prelude::*;
///
/// let hierarchy = Hierarchy::new();
/// let logger = hierarchy.get_logger("db");
///
/// logger.at(Level::ERROR)
///     .field("error_code", "DB_CONN_TIMEOUT")
///     .field("retry_count", 3)
///     .log("Database connection failed");
/// ```
#[must_use = "the event is only emitted by calling log()"]
pub struct EventBuilder<'a> {
    logger: &'a Logger,
    level: Level,
    enabled: bool,
    context: LogContext,
    throwable: Option<ThrowableInformation>,
    location: LocationInfo,
}

impl<'a> EventBuilder<'a> {
    pub(crate) fn new(logger: &'a Logger, level: Level, location: LocationInfo) -> Self {
        let enabled = logger.is_enabled_for(&level);
        Self {
            logger,
            level,
            enabled,
            context: LogContext::new(),
            throwable: None,
            location,
        }
    }

    /// Whether `log` will emit anything
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Add a structured field
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        if self.enabled {
            self.context.add_field(key, value);
        }
        self
    }

    /// Add multiple fields from a LogContext
    pub fn fields(mut self, context: LogContext) -> Self {
        if self.enabled {
            for (key, value) in context.fields().iter() {
                self.context.add_field(key.clone(), value.clone());
            }
        }
        self
    }

    /// Attach an error and its source chain
    pub fn error(mut self, error: &(dyn Error + 'static)) -> Self {
        if self.enabled {
            self.throwable = Some(ThrowableInformation::from_error(error));
        }
        self
    }

    /// Override the captured call site
    pub fn location(mut self, location: LocationInfo) -> Self {
        self.location = location;
        self
    }

    /// Build and dispatch the event
    pub fn log(self, message: impl Into<Message>) {
        if !self.enabled {
            return;
        }
        self.logger.forced_log(
            self.level,
            message.into(),
            Some(self.location),
            self.throwable,
            self.context,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;
    use crate::core::hierarchy::Hierarchy;

    #[test]
    fn test_builder_attaches_fields_and_error() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.get_logger("builder");
        let (appender, handle) = MemoryAppender::memory("mem", 10);
        logger.add_appender(appender.activated().unwrap());

        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        logger
            .at(Level::WARN)
            .field("user_id", 12345)
            .field("latency_ms", 42.5)
            .fields(LogContext::new().with_field("request_id", "abc-123"))
            .error(&err)
            .log("Request slow");

        let events = handle.events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.rendered_message(), "Request slow");
        assert_eq!(event.fields().get("user_id"), Some(&FieldValue::Int(12345)));
        assert_eq!(event.fields().len(), 3);
        assert_eq!(event.throwable().unwrap().lines()[0], "timed out");
        assert!(event.location().unwrap().file().ends_with("builder.rs"));
    }

    #[test]
    fn test_disabled_builder_emits_nothing() {
        let hierarchy = Hierarchy::new();
        hierarchy.root_logger().set_level(Some(Level::ERROR));
        let logger = hierarchy.get_logger("builder");
        let (appender, handle) = MemoryAppender::memory("mem", 10);
        logger.add_appender(appender.activated().unwrap());

        let builder = logger.at(Level::INFO).field("ignored", true);
        assert!(!builder.is_enabled());
        builder.log("not logged");
        assert!(handle.is_empty());
    }
}
