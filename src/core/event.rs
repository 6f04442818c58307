//! Logging event
//!
//! A [`LoggingEvent`] is the snapshot of one accepted log call. Everything is
//! captured when the event is built (timestamp, thread, diagnostic contexts,
//! error chain, call site); the only lazily computed part is the rendered text
//! of an object message, which is memoized.

use super::diagnostic::{Mdc, Ndc};
use super::level::Level;
use super::location::LocationInfo;
use super::log_context::{FieldValue, LogContext};
use super::renderer::{LogObject, ObjectRenderer};
use super::throwable::ThrowableInformation;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static THREAD_NAME_CACHE: RefCell<Option<Arc<str>>> = const { RefCell::new(None) };
}

/// Cached thread name, falling back to the thread id for unnamed threads
fn current_thread_name() -> Arc<str> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let thread = std::thread::current();
                match thread.name() {
                    Some(name) => Arc::from(name),
                    None => Arc::from(format!("{:?}", thread.id())),
                }
            })
            .clone()
    })
}

/// Message carried by an event
#[derive(Clone)]
pub enum Message {
    Text(String),
    Object(Arc<dyn LogObject>),
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Message::Object(object) => f.debug_tuple("Object").field(object).finish(),
        }
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

#[derive(Clone)]
pub struct LoggingEvent {
    logger_name: Arc<str>,
    level: Level,
    message: Message,
    renderer: Option<Arc<dyn ObjectRenderer>>,
    rendered: OnceLock<String>,
    timestamp: DateTime<Utc>,
    sequence_number: u64,
    thread_name: Arc<str>,
    throwable: Option<ThrowableInformation>,
    ndc: Option<String>,
    mdc: Option<LogContext>,
    fields: LogContext,
    location: Option<LocationInfo>,
}

impl LoggingEvent {
    /// Build an event on the current thread, snapshotting its diagnostic
    /// contexts.
    pub fn new(logger_name: impl Into<Arc<str>>, level: Level, message: impl Into<Message>) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            renderer: None,
            rendered: OnceLock::new(),
            timestamp: Utc::now(),
            sequence_number: SEQUENCE.fetch_add(1, Ordering::Relaxed),
            thread_name: current_thread_name(),
            throwable: None,
            ndc: Ndc::get(),
            mdc: Mdc::snapshot(),
            fields: LogContext::new(),
            location: None,
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Option<Arc<dyn ObjectRenderer>>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: &(dyn Error + 'static)) -> Self {
        self.throwable = Some(ThrowableInformation::from_error(error));
        self
    }

    #[must_use]
    pub fn with_throwable(mut self, throwable: ThrowableInformation) -> Self {
        self.throwable = Some(throwable);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: LocationInfo) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: LogContext) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The message as text. Object messages go through the renderer captured
    /// at construction, or `Debug` when there is none; the result is cached.
    pub fn rendered_message(&self) -> &str {
        match &self.message {
            Message::Text(text) => text,
            Message::Object(object) => self.rendered.get_or_init(|| {
                let object: &dyn LogObject = &**object;
                match &self.renderer {
                    Some(renderer) => renderer.render(object.as_any()),
                    None => format!("{:?}", object),
                }
            }),
        }
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Process-wide creation order of events
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn throwable(&self) -> Option<&ThrowableInformation> {
        self.throwable.as_ref()
    }

    pub fn ndc(&self) -> Option<&str> {
        self.ndc.as_deref()
    }

    pub fn mdc(&self) -> Option<&LogContext> {
        self.mdc.as_ref()
    }

    pub fn mdc_value(&self, key: &str) -> Option<&FieldValue> {
        self.mdc.as_ref().and_then(|mdc| mdc.get(key))
    }

    /// Fields attached explicitly to this event
    pub fn fields(&self) -> &LogContext {
        &self.fields
    }

    pub fn location(&self) -> Option<&LocationInfo> {
        self.location.as_ref()
    }
}

impl fmt::Debug for LoggingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingEvent")
            .field("logger_name", &self.logger_name)
            .field("level", &self.level.name())
            .field("message", &self.message)
            .field("timestamp", &self.timestamp)
            .field("sequence_number", &self.sequence_number)
            .field("thread_name", &self.thread_name)
            .field("throwable", &self.throwable)
            .field("ndc", &self.ndc)
            .field("mdc", &self.mdc)
            .field("fields", &self.fields)
            .field("location", &self.location)
            .finish()
    }
}
