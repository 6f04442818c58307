//! Core types: levels, events, the logger hierarchy and the appender pipeline

pub mod appender;
pub mod builder;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod error_handler;
pub mod event;
pub mod filter;
pub mod hierarchy;
pub mod internal_log;
pub mod layout;
pub mod level;
pub mod listener;
pub mod location;
pub mod log_context;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod renderer;
pub mod selector;
pub mod throwable;
pub mod timestamp;

pub use appender::{
    render_event, Append, AppendOutcome, Appender, AppenderCore, AppenderList, AppenderSkeleton,
    AppenderState,
};
pub use builder::EventBuilder;
pub use config::{
    AppenderConfig, ConfigReport, Configurator, FilterConfig, HierarchyConfig, LayoutConfig,
    LoggerConfig,
};
pub use diagnostic::{Mdc, MdcGuard, Ndc, NdcGuard};
pub use error::{LoggerError, Result};
pub use error_handler::{
    DeactivatingErrorHandler, ErrorDisposition, ErrorHandler, FloodControlErrorHandler,
    OnlyOnceErrorHandler,
};
pub use event::{LoggingEvent, Message};
pub use filter::{
    CustomFilter, DenyAllFilter, Filter, FilterChain, FilterDecision, LevelMatchFilter,
    LevelRangeFilter, LoggerNameFilter, MdcMatchFilter, StringMatchFilter,
};
pub use hierarchy::Hierarchy;
pub use layout::{JsonLayout, Layout, LogfmtLayout, SimpleLayout, TextLayout};
#[allow(deprecated)]
pub use level::{Level, Priority};
pub use listener::{HierarchyEventListener, RepositoryEventListener};
pub use location::LocationInfo;
pub use log_context::{FieldValue, LogContext};
pub use logger::{DefaultLoggerFactory, Logger, LoggerFactory, ROOT_LOGGER_NAME};
pub use metrics::DispatchMetrics;
pub use overflow_policy::{OverflowCallback, OverflowPolicy, DEFAULT_BLOCK_TIMEOUT};
pub use renderer::{FnRenderer, LogObject, ObjectRenderer, RendererMap};
pub use selector::{
    ContextRepositorySelector, DefaultRepositorySelector, LogManager, RepositorySelector,
};
pub use throwable::ThrowableInformation;
pub use timestamp::TimestampFormat;
