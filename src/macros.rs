//! Logging macros for ergonomic log message formatting.
//!
//! These macros check whether the logger is enabled for the level before
//! formatting anything, and record the call site of the macro invocation.
//!
//! # Examples
//!
//! ```
//! use rust_logger_hierarchy::prelude::*;
//! use rust_logger_hierarchy::info;
//!
//! let hierarchy = Hierarchy::new();
//! let logger = hierarchy.get_logger("server");
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Complex formatting
//! let user_id = 42;
//! let action = "login";
//! info!(logger, "User {} performed action: {}", user_id, action);
//! ```

/// Log a message at any level.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let hierarchy = Hierarchy::new();
/// # let logger = hierarchy.get_logger("app");
/// use rust_logger_hierarchy::log;
/// log!(logger, Level::INFO, "Simple message");
/// log!(logger, Level::ERROR, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled_for(&level) {
            logger.forced_log(
                level,
                $crate::core::Message::Text(format!($($arg)+)),
                Some($crate::core::LocationInfo::new(file!(), line!(), module_path!())),
                None,
                $crate::core::LogContext::new(),
            );
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let hierarchy = Hierarchy::new();
/// # let logger = hierarchy.get_logger("app");
/// # logger.set_level(Some(Level::TRACE));
/// use rust_logger_hierarchy::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::TRACE, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let hierarchy = Hierarchy::new();
/// # let logger = hierarchy.get_logger("app");
/// use rust_logger_hierarchy::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DEBUG, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::INFO, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let hierarchy = Hierarchy::new();
/// # let logger = hierarchy.get_logger("app");
/// use rust_logger_hierarchy::warn;
/// warn!(logger, "Low memory");
/// warn!(logger, "Disk usage at {}%", 85);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::WARN, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::ERROR, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let hierarchy = Hierarchy::new();
/// # let logger = hierarchy.get_logger("app");
/// use rust_logger_hierarchy::fatal;
/// fatal!(logger, "System crash");
/// fatal!(logger, "Fatal error: {}", "out of memory");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::FATAL, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::appenders::MemoryAppender;
    use crate::core::{Hierarchy, Level};
    use std::cell::Cell;

    #[test]
    fn test_macros_record_call_site() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.get_logger("macros");
        let (appender, handle) = MemoryAppender::memory("mem", 10);
        logger.add_appender(appender.activated().unwrap());

        info!(logger, "Hello {}", "world");
        fatal!(logger, "code {}", 7);

        let events = handle.events();
        assert_eq!(handle.messages(), vec!["Hello world", "code 7"]);
        let location = events[0].location().unwrap();
        assert!(location.file().ends_with("macros.rs"));
        assert!(location.module_path().ends_with("macros::tests"));
        assert_eq!(events[1].level(), &Level::FATAL);
    }

    #[test]
    fn test_disabled_macro_does_not_format() {
        struct Expensive<'a>(&'a Cell<u32>);
        impl std::fmt::Display for Expensive<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.set(self.0.get() + 1);
                write!(f, "expensive")
            }
        }

        let hierarchy = Hierarchy::new();
        let logger = hierarchy.get_logger("macros");
        let calls = Cell::new(0);

        trace!(logger, "{}", Expensive(&calls));
        assert_eq!(calls.get(), 0);

        logger.set_level(Some(Level::TRACE));
        trace!(logger, "{}", Expensive(&calls));
        assert_eq!(calls.get(), 1);
    }
}
