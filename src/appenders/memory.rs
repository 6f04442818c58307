//! In-memory and discarding appenders

use crate::core::{Append, AppenderSkeleton, Layout, LoggingEvent, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Captured {
    events: VecDeque<LoggingEvent>,
    formatted: VecDeque<String>,
    evicted: u64,
}

/// Shared view of what a [`MemorySink`] captured
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    inner: Arc<Mutex<Captured>>,
    capacity: usize,
}

impl MemoryHandle {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Captured::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn events(&self) -> Vec<LoggingEvent> {
        self.inner.lock().events.iter().cloned().collect()
    }

    /// Rendered messages in arrival order
    pub fn messages(&self) -> Vec<String> {
        self.inner
            .lock()
            .events
            .iter()
            .map(|e| e.rendered_message().to_string())
            .collect()
    }

    /// Layout output, when the appender has a layout
    pub fn formatted(&self) -> Vec<String> {
        self.inner.lock().formatted.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }

    /// Events pushed out because the buffer was full
    pub fn evicted(&self) -> u64 {
        self.inner.lock().evicted
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.events.clear();
        inner.formatted.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Keeps the most recent events in memory
///
/// Once `capacity` is reached the oldest event is evicted.
pub struct MemorySink {
    handle: MemoryHandle,
}

impl MemorySink {
    pub fn new(capacity: usize) -> (Self, MemoryHandle) {
        let handle = MemoryHandle::new(capacity);
        (Self::with_handle(handle.clone()), handle)
    }

    /// Write into an existing buffer, e.g. one kept across reconfiguration
    pub fn with_handle(handle: MemoryHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &MemoryHandle {
        &self.handle
    }
}

impl Append for MemorySink {
    fn append(&mut self, event: &LoggingEvent, layout: Option<&dyn Layout>) -> Result<()> {
        let formatted = layout.map(|l| l.format(event));
        let capacity = self.handle.capacity;
        let mut inner = self.handle.inner.lock();
        if inner.events.len() >= capacity {
            inner.events.pop_front();
            inner.formatted.pop_front();
            inner.evicted += 1;
        }
        inner.events.push_back(event.clone());
        if let Some(formatted) = formatted {
            inner.formatted.push_back(formatted);
        }
        Ok(())
    }
}

pub type MemoryAppender = AppenderSkeleton<MemorySink>;

impl AppenderSkeleton<MemorySink> {
    /// Unformatted capture of up to `capacity` events
    pub fn memory(name: impl Into<String>, capacity: usize) -> (Self, MemoryHandle) {
        let (sink, handle) = MemorySink::new(capacity);
        (Self::new(name, sink), handle)
    }
}

/// Accepts and discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Append for NullSink {
    fn append(&mut self, _event: &LoggingEvent, _layout: Option<&dyn Layout>) -> Result<()> {
        Ok(())
    }
}

pub type NullAppender = AppenderSkeleton<NullSink>;

impl AppenderSkeleton<NullSink> {
    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, NullSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Appender, Level, SimpleLayout};

    #[test]
    fn test_memory_capture_and_eviction() {
        let (appender, handle) = MemoryAppender::memory("mem", 2);
        let appender = appender.with_layout(SimpleLayout).activated().unwrap();

        for msg in ["one", "two", "three"] {
            appender.do_append(&LoggingEvent::new("m", Level::INFO, msg));
        }

        assert_eq!(handle.messages(), vec!["two", "three"]);
        assert_eq!(handle.formatted(), vec!["INFO - two", "INFO - three"]);
        assert_eq!(handle.evicted(), 1);

        handle.clear();
        assert!(handle.is_empty());
    }

    #[test]
    fn test_shared_handle_survives_appender() {
        let handle = MemoryHandle::new(10);
        {
            let appender = AppenderSkeleton::new("a", MemorySink::with_handle(handle.clone()))
                .activated()
                .unwrap();
            appender.do_append(&LoggingEvent::new("m", Level::INFO, "kept"));
        }
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_null_appender() {
        let appender = NullAppender::null("null").activated().unwrap();
        appender.do_append(&LoggingEvent::new("m", Level::INFO, "gone"));
        assert_eq!(appender.core().error_handler().error_count(), 0);
    }
}
