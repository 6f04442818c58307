//! Appender implementations
//!
//! Sinks (`console`, `file`, `memory`) plug into [`AppenderSkeleton`];
//! composites (`async_appender`, `hub`) forward to child appenders.
//!
//! [`AppenderSkeleton`]: crate::core::AppenderSkeleton

pub mod async_appender;
pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod hub;
pub mod memory;

pub use async_appender::{AsyncAppender, AsyncAppenderBuilder};
pub use console::{ConsoleAppender, ConsoleSink, ConsoleTarget};
#[cfg(feature = "file")]
pub use file::{FileAppender, FileSink};
pub use hub::HubAppender;
pub use memory::{MemoryAppender, MemoryHandle, MemorySink, NullAppender, NullSink};

pub use crate::core::Appender;
