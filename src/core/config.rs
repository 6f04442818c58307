//! Format-agnostic hierarchy configuration
//!
//! [`HierarchyConfig`] is a plain serde model: any serde format can produce
//! it, and [`HierarchyConfig::from_json`] covers the common case.
//! [`Configurator`] applies it to a [`Hierarchy`]. Problems never abort the
//! run: each one is collected into the returned [`ConfigReport`], added to
//! the hierarchy error list and reported through `internal_log`, and the
//! affected logger or appender is left unconfigured.

use super::appender::{Append, Appender, AppenderSkeleton};
use super::error::{LoggerError, Result};
use super::error_handler::{
    DeactivatingErrorHandler, ErrorHandler, FloodControlErrorHandler, OnlyOnceErrorHandler,
};
use super::filter::{
    DenyAllFilter, Filter, LevelMatchFilter, LevelRangeFilter, LoggerNameFilter, MdcMatchFilter,
    StringMatchFilter,
};
use super::hierarchy::Hierarchy;
use super::internal_log;
use super::layout::{JsonLayout, Layout, LogfmtLayout, SimpleLayout, TextLayout};
use super::level::Level;
use super::logger::Logger;
use super::overflow_policy::{OverflowPolicy, DEFAULT_BLOCK_TIMEOUT};
use super::timestamp::TimestampFormat;
use crate::appenders::{AsyncAppender, ConsoleSink, ConsoleTarget, HubAppender, MemorySink, NullSink};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Capacity of memory appenders built from configuration
pub const DEFAULT_MEMORY_CAPACITY: usize = 1000;

/// Whole-hierarchy configuration
///
/// ```
/// use rust_logger_hierarchy::core::HierarchyConfig;
///
/// let config = HierarchyConfig::from_json(r#"{
///     "threshold": "debug",
///     "root": { "level": "info", "appenders": ["console"] },
///     "loggers": { "com.foo": { "level": "warn", "additivity": false } },
///     "appenders": { "console": { "kind": "console", "target": "stderr" } }
/// }"#).unwrap();
///
/// assert_eq!(config.loggers["com.foo"].additivity, Some(false));
/// assert_eq!(config.appenders["console"].kind, "console");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Reset the hierarchy before applying
    pub reset: bool,
    /// Turn on `[LOGGER DEBUG]` output
    pub debug: bool,
    pub threshold: Option<String>,
    pub root: Option<LoggerConfig>,
    pub loggers: BTreeMap<String, LoggerConfig>,
    pub appenders: BTreeMap<String, AppenderConfig>,
}

impl HierarchyConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Level name; `inherited` or `null` clears an explicit level
    pub level: Option<String>,
    pub additivity: Option<bool>,
    /// Appender names, attached in this order
    pub appenders: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppenderConfig {
    /// `console`, `file`, `memory`, `null`, `async` or `hub`
    pub kind: String,
    pub threshold: Option<String>,
    pub layout: Option<LayoutConfig>,
    pub filters: Vec<FilterConfig>,
    /// `only_once`, `flood_control` or `deactivating`
    pub error_handler: Option<String>,
    pub error_limit: Option<u64>,

    // console
    pub target: Option<String>,
    pub colors: Option<bool>,

    // file
    pub path: Option<PathBuf>,
    pub append: Option<bool>,
    pub immediate_flush: Option<bool>,

    // memory
    pub capacity: Option<usize>,

    // file buffer in bytes, async buffer in events
    pub buffer_size: Option<usize>,

    // async
    pub overflow: Option<String>,
    pub overflow_timeout_ms: Option<u64>,

    /// Children of `async` and `hub` appenders
    pub appenders: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// `simple`, `text`, `json` or `logfmt`
    pub kind: String,
    pub timestamp: Option<TimestampFormat>,
    pub location: bool,
    pub mdc: bool,
    pub pretty: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// `level_match`, `level_range`, `string_match`, `mdc_match`,
    /// `logger_name` or `deny_all`
    pub kind: String,
    pub level: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub accept_on_match: Option<bool>,
}

/// Problems found while applying a configuration
#[derive(Debug, Default)]
pub struct ConfigReport {
    errors: Vec<LoggerError>,
}

impl ConfigReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LoggerError] {
        &self.errors
    }
}

fn normalized(kind: &str) -> String {
    kind.trim().to_ascii_lowercase().replace('-', "_")
}

fn parse_level(value: &str) -> Result<Level> {
    value
        .parse::<Level>()
        .map_err(|_| LoggerError::invalid_level(value))
}

/// Applies a [`HierarchyConfig`] to a hierarchy
///
/// Appenders referenced by name are looked up first among the ones
/// registered with [`Configurator::register_appender`], then built from the
/// configuration. Each configured appender is built once per run, so several
/// loggers naming it share one instance. Existing appenders are kept unless
/// the configuration asks for a reset.
pub struct Configurator<'a> {
    hierarchy: &'a Hierarchy,
    registered: HashMap<String, Arc<dyn Appender>>,
}

impl<'a> Configurator<'a> {
    pub fn new(hierarchy: &'a Hierarchy) -> Self {
        Self {
            hierarchy,
            registered: HashMap::new(),
        }
    }

    /// Make an appender built in code available under its name
    pub fn register_appender(&mut self, appender: Arc<dyn Appender>) -> &mut Self {
        self.registered.insert(appender.name().to_string(), appender);
        self
    }

    /// Parse JSON and apply it; parse failures end up in the report
    pub fn configure_json(&self, json: &str) -> ConfigReport {
        match HierarchyConfig::from_json(json) {
            Ok(config) => self.configure(&config),
            Err(e) => {
                let mut pass = Pass::new(self, &EMPTY);
                pass.fail(e);
                pass.report()
            }
        }
    }

    pub fn configure(&self, config: &HierarchyConfig) -> ConfigReport {
        if config.debug {
            internal_log::set_internal_debugging(true);
        }
        if config.reset {
            self.hierarchy.reset_configuration();
        }

        let mut pass = Pass::new(self, config);

        if let Some(threshold) = &config.threshold {
            match parse_level(threshold) {
                Ok(level) => self.hierarchy.set_threshold(level),
                Err(e) => pass.fail(e),
            }
        }

        if let Some(root) = &config.root {
            pass.apply_logger(&self.hierarchy.root_logger(), root);
        }
        for (name, logger_config) in &config.loggers {
            let logger = self.hierarchy.get_logger(name);
            pass.apply_logger(&logger, logger_config);
        }

        self.hierarchy.set_pristine(false);
        self.hierarchy.fire_configuration_changed();
        pass.report()
    }
}

static EMPTY: HierarchyConfig = HierarchyConfig {
    reset: false,
    debug: false,
    threshold: None,
    root: None,
    loggers: BTreeMap::new(),
    appenders: BTreeMap::new(),
};

/// State of one `configure` call
struct Pass<'c, 'h> {
    configurator: &'c Configurator<'h>,
    config: &'c HierarchyConfig,
    built: HashMap<String, Arc<dyn Appender>>,
    resolving: Vec<String>,
    errors: Vec<LoggerError>,
}

impl<'c, 'h> Pass<'c, 'h> {
    fn new(configurator: &'c Configurator<'h>, config: &'c HierarchyConfig) -> Self {
        Self {
            configurator,
            config,
            built: HashMap::new(),
            resolving: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, error: LoggerError) {
        internal_log::error(&error);
        self.configurator.hierarchy.add_error_item(error.to_string());
        self.errors.push(error);
    }

    fn report(self) -> ConfigReport {
        ConfigReport {
            errors: self.errors,
        }
    }

    fn apply_logger(&mut self, logger: &Logger, config: &LoggerConfig) {
        if let Some(level) = &config.level {
            let cleared = level.eq_ignore_ascii_case("inherited") || level.eq_ignore_ascii_case("null");
            if cleared && logger.is_root() {
                self.fail(LoggerError::config(
                    "root logger",
                    "the root logger level cannot be inherited",
                ));
            } else if cleared {
                logger.set_level(None);
            } else {
                match parse_level(level) {
                    Ok(level) => logger.set_level(Some(level)),
                    Err(e) => self.fail(e),
                }
            }
        }

        if let Some(additivity) = config.additivity {
            logger.set_additivity(additivity);
        }

        for name in &config.appenders {
            if let Some(appender) = self.resolve(name) {
                logger.add_appender(appender);
            }
        }
    }

    /// Find or build the appender with this name, activated
    fn resolve(&mut self, name: &str) -> Option<Arc<dyn Appender>> {
        if let Some(appender) = self.built.get(name) {
            return Some(Arc::clone(appender));
        }

        let appender = if let Some(registered) = self.configurator.registered.get(name) {
            Arc::clone(registered)
        } else {
            let config = self.config;
            let Some(appender_config) = config.appenders.get(name) else {
                self.fail(LoggerError::config(
                    "appender reference",
                    format!("no appender named [{}]", name),
                ));
                return None;
            };
            if self.resolving.iter().any(|n| n == name) {
                self.fail(LoggerError::config(
                    "appender reference",
                    format!("appender [{}] refers to itself", name),
                ));
                return None;
            }

            self.resolving.push(name.to_string());
            let built = self.build(name, appender_config);
            self.resolving.pop();

            match built {
                Ok(appender) => appender,
                Err(e) => {
                    self.fail(e);
                    return None;
                }
            }
        };

        if !appender.core().is_active() {
            if let Err(e) = appender.activate_options() {
                self.fail(e);
                return None;
            }
        }

        internal_log::debug(format_args!("Resolved appender [{}]", name));
        self.built.insert(name.to_string(), Arc::clone(&appender));
        Some(appender)
    }

    fn build(&mut self, name: &str, config: &AppenderConfig) -> Result<Arc<dyn Appender>> {
        let appender: Arc<dyn Appender> = match normalized(&config.kind).as_str() {
            "console" => {
                let target = match &config.target {
                    Some(target) => target.parse::<ConsoleTarget>()?,
                    None => ConsoleTarget::Stdout,
                };
                let sink = ConsoleSink::new(target)
                    .with_colors(config.colors.unwrap_or(false))
                    .with_immediate_flush(config.immediate_flush.unwrap_or(true));
                skeleton(name, sink, Some(Arc::new(TextLayout::new())))
            }
            #[cfg(feature = "file")]
            "file" => {
                let path = config.path.clone().ok_or_else(|| {
                    LoggerError::config(format!("appender [{}]", name), "file appender needs a path")
                })?;
                let mut sink = crate::appenders::FileSink::new(path)
                    .with_append(config.append.unwrap_or(true))
                    .with_immediate_flush(config.immediate_flush.unwrap_or(true));
                if let Some(buffer_size) = config.buffer_size {
                    sink = sink.with_buffer_size(buffer_size);
                }
                skeleton(name, sink, Some(Arc::new(TextLayout::new())))
            }
            "memory" => {
                let (sink, _) = MemorySink::new(config.capacity.unwrap_or(DEFAULT_MEMORY_CAPACITY));
                skeleton(name, sink, None)
            }
            "null" => skeleton(name, NullSink, None),
            "async" => {
                let timeout = config
                    .overflow_timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_BLOCK_TIMEOUT);
                let mut builder = AsyncAppender::builder(name);
                if let Some(policy) = &config.overflow {
                    let policy = OverflowPolicy::from_name(policy, timeout).ok_or_else(|| {
                        LoggerError::unknown_kind("overflow policy", policy.as_str())
                    })?;
                    builder = builder.overflow(policy);
                }
                if let Some(buffer_size) = config.buffer_size {
                    builder = builder.buffer_size(buffer_size);
                }
                let appender = builder.build();
                for child in &config.appenders {
                    if let Some(child) = self.resolve(child) {
                        appender.add_appender(child);
                    }
                }
                Arc::new(appender)
            }
            "hub" => {
                let appender = HubAppender::new(name);
                for child in &config.appenders {
                    if let Some(child) = self.resolve(child) {
                        appender.add_appender(child);
                    }
                }
                Arc::new(appender)
            }
            _ => return Err(LoggerError::unknown_kind("appender", config.kind.as_str())),
        };

        let core = appender.core();
        if let Some(threshold) = &config.threshold {
            core.set_threshold(parse_level(threshold)?);
        }
        if let Some(layout) = &config.layout {
            core.set_layout(Some(build_layout(layout)?));
        }
        if let Some(handler) = &config.error_handler {
            core.set_error_handler(build_error_handler(handler, config.error_limit)?);
        }
        for filter in &config.filters {
            match build_filter(filter) {
                Ok(filter) => core.add_filter(filter),
                Err(e) => self.fail(e),
            }
        }
        Ok(appender)
    }
}

fn skeleton<A: Append + 'static>(
    name: &str,
    sink: A,
    layout: Option<Arc<dyn Layout>>,
) -> Arc<dyn Appender> {
    let appender = AppenderSkeleton::new(name, sink);
    appender.core().set_layout(layout);
    Arc::new(appender)
}

fn build_layout(config: &LayoutConfig) -> Result<Arc<dyn Layout>> {
    let timestamp = config.timestamp.clone().unwrap_or_default();
    let layout: Arc<dyn Layout> = match normalized(&config.kind).as_str() {
        "simple" => Arc::new(SimpleLayout),
        "" | "text" => Arc::new(
            TextLayout::new()
                .with_timestamp_format(timestamp)
                .with_location(config.location)
                .with_mdc(config.mdc),
        ),
        "json" => Arc::new(
            JsonLayout::new()
                .with_timestamp_format(timestamp)
                .pretty(config.pretty),
        ),
        "logfmt" => Arc::new(LogfmtLayout::new().with_timestamp_format(timestamp)),
        _ => return Err(LoggerError::unknown_kind("layout", config.kind.as_str())),
    };
    Ok(layout)
}

fn build_error_handler(kind: &str, limit: Option<u64>) -> Result<Arc<dyn ErrorHandler>> {
    let handler: Arc<dyn ErrorHandler> = match normalized(kind).as_str() {
        "only_once" => Arc::new(OnlyOnceErrorHandler::new()),
        "flood_control" => Arc::new(FloodControlErrorHandler::new(limit.unwrap_or(10))),
        "deactivating" => Arc::new(DeactivatingErrorHandler::new(limit.unwrap_or(1))),
        _ => return Err(LoggerError::unknown_kind("error handler", kind)),
    };
    Ok(handler)
}

fn required<'v>(value: &'v Option<String>, filter: &str, field: &str) -> Result<&'v str> {
    value.as_deref().ok_or_else(|| {
        LoggerError::config(format!("{} filter", filter), format!("missing [{}]", field))
    })
}

fn build_filter(config: &FilterConfig) -> Result<Arc<dyn Filter>> {
    let kind = normalized(&config.kind);
    let accept = config.accept_on_match;
    let filter: Arc<dyn Filter> = match kind.as_str() {
        "level_match" => {
            let level = parse_level(required(&config.level, &kind, "level")?)?;
            let filter = LevelMatchFilter::new(level);
            Arc::new(match accept {
                Some(accept) => filter.accept_on_match(accept),
                None => filter,
            })
        }
        "level_range" => {
            let min = config.min.as_deref().map(parse_level).transpose()?;
            let max = config.max.as_deref().map(parse_level).transpose()?;
            let filter = LevelRangeFilter::new(min, max);
            Arc::new(match accept {
                Some(accept) => filter.accept_on_match(accept),
                None => filter,
            })
        }
        "string_match" => {
            let filter = StringMatchFilter::new(required(&config.value, &kind, "value")?);
            Arc::new(match accept {
                Some(accept) => filter.accept_on_match(accept),
                None => filter,
            })
        }
        "mdc_match" => {
            let filter = MdcMatchFilter::new(
                required(&config.key, &kind, "key")?,
                required(&config.value, &kind, "value")?,
            );
            Arc::new(match accept {
                Some(accept) => filter.accept_on_match(accept),
                None => filter,
            })
        }
        "logger_name" => {
            let filter = LoggerNameFilter::new(required(&config.value, &kind, "value")?);
            Arc::new(match accept {
                Some(accept) => filter.accept_on_match(accept),
                None => filter,
            })
        }
        "deny_all" => Arc::new(DenyAllFilter),
        _ => return Err(LoggerError::unknown_kind("filter", config.kind.as_str())),
    };
    Ok(filter)
}
