//! # Rust Logger Hierarchy
//!
//! A hierarchical, appender-based logging framework.
//!
//! ## Features
//!
//! - **Named logger tree**: `a.b.c` inherits its level and appenders from
//!   `a.b`, `a` and the root, whatever order the loggers are created in
//! - **Additivity**: events travel up the tree until a non-additive logger
//! - **Appender pipeline**: threshold, filter chain, layout and per-appender
//!   error handler; a failing appender never fails the caller
//! - **Asynchronous dispatch**: bounded buffer with a dedicated dispatcher
//!   thread that falls back to synchronous dispatch instead of losing events
//! - **Diagnostic contexts**: thread-local MDC and NDC copied into each event
//!
//! ## Example
//!
//! ```
//! use rust_logger_hierarchy::prelude::*;
//!
//! let hierarchy = Hierarchy::new();
//! let (appender, handle) = MemoryAppender::memory("memory", 100);
//! hierarchy.get_logger("com.foo").add_appender(appender.activated().unwrap());
//!
//! let logger = hierarchy.get_logger("com.foo.bar");
//! logger.info("inherited appender");
//! logger.debug("root is at DEBUG");
//!
//! hierarchy.set_threshold(Level::INFO);
//! logger.debug("below the repository threshold");
//!
//! assert_eq!(handle.len(), 2);
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    #[cfg(feature = "file")]
    pub use crate::appenders::{FileAppender, FileSink};
    pub use crate::appenders::{
        AsyncAppender, ConsoleAppender, ConsoleSink, ConsoleTarget, HubAppender, MemoryAppender,
        MemoryHandle, MemorySink, NullAppender,
    };
    pub use crate::core::{
        Append, Appender, AppenderSkeleton, Configurator, FieldValue, Filter, FilterDecision,
        Hierarchy, HierarchyConfig, JsonLayout, Layout, Level, LogContext, LogManager, Logger,
        LoggerError, LoggingEvent, Mdc, Ndc, OverflowPolicy, Result, SimpleLayout, TextLayout,
        TimestampFormat,
    };
}

#[cfg(feature = "file")]
pub use appenders::FileAppender;
pub use appenders::{AsyncAppender, ConsoleAppender, HubAppender, MemoryAppender};
pub use core::{
    internal_log, Appender, DispatchMetrics, FieldValue, Hierarchy, Level, LogContext, LogManager,
    Logger, LoggerError, LoggingEvent, OverflowCallback, OverflowPolicy, Result, TimestampFormat,
};
