//! Per-appender error handlers
//!
//! Failures inside an appender never reach the logging call site. They are
//! handed to the appender's [`ErrorHandler`], which decides whether to print
//! them through the internal diagnostic channel and whether the appender
//! should keep running.

use super::error::LoggerError;
use super::event::LoggingEvent;
use super::internal_log;
use std::sync::atomic::{AtomicU64, Ordering};

/// What the appender should do after an error was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    Continue,
    /// Stop accepting events until reactivated
    Deactivate,
}

pub trait ErrorHandler: Send + Sync {
    fn error(
        &self,
        appender: &str,
        error: &LoggerError,
        event: Option<&LoggingEvent>,
    ) -> ErrorDisposition;

    /// Number of errors seen so far
    fn error_count(&self) -> u64;
}

fn describe(appender: &str, error: &LoggerError, event: Option<&LoggingEvent>) -> String {
    match event {
        Some(event) => format!(
            "Appender [{}] failed on event from [{}]: {}",
            appender,
            event.logger_name(),
            error
        ),
        None => format!("Appender [{}] failed: {}", appender, error),
    }
}

/// Prints the first error and counts the rest silently
///
/// Default handler of every appender.
#[derive(Debug, Default)]
pub struct OnlyOnceErrorHandler {
    count: AtomicU64,
}

impl OnlyOnceErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorHandler for OnlyOnceErrorHandler {
    fn error(
        &self,
        appender: &str,
        error: &LoggerError,
        event: Option<&LoggingEvent>,
    ) -> ErrorDisposition {
        if self.count.fetch_add(1, Ordering::Relaxed) == 0 {
            internal_log::error(describe(appender, error, event));
        }
        ErrorDisposition::Continue
    }

    fn error_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Prints the first `limit` errors, then a single suppression notice
#[derive(Debug)]
pub struct FloodControlErrorHandler {
    limit: u64,
    count: AtomicU64,
}

impl FloodControlErrorHandler {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            count: AtomicU64::new(0),
        }
    }

    /// Errors that were counted but not printed
    pub fn suppressed_count(&self) -> u64 {
        self.error_count().saturating_sub(self.limit)
    }
}

impl ErrorHandler for FloodControlErrorHandler {
    fn error(
        &self,
        appender: &str,
        error: &LoggerError,
        event: Option<&LoggingEvent>,
    ) -> ErrorDisposition {
        let seen = self.count.fetch_add(1, Ordering::Relaxed);
        if seen < self.limit {
            internal_log::error(describe(appender, error, event));
        } else if seen == self.limit {
            internal_log::warn(format!(
                "Appender [{}] reported {} errors, suppressing further reports",
                appender, self.limit
            ));
        }
        ErrorDisposition::Continue
    }

    fn error_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Reports every error and deactivates the appender once `max_failures` is
/// reached
#[derive(Debug)]
pub struct DeactivatingErrorHandler {
    max_failures: u64,
    count: AtomicU64,
}

impl DeactivatingErrorHandler {
    pub fn new(max_failures: u64) -> Self {
        Self {
            max_failures: max_failures.max(1),
            count: AtomicU64::new(0),
        }
    }
}

impl ErrorHandler for DeactivatingErrorHandler {
    fn error(
        &self,
        appender: &str,
        error: &LoggerError,
        event: Option<&LoggingEvent>,
    ) -> ErrorDisposition {
        let seen = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        internal_log::error(describe(appender, error, event));
        if seen >= self.max_failures {
            if seen == self.max_failures {
                internal_log::warn(format!(
                    "Deactivating appender [{}] after {} failures",
                    appender, seen
                ));
            }
            ErrorDisposition::Deactivate
        } else {
            ErrorDisposition::Continue
        }
    }

    fn error_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
