//! Appender filter chains
//!
//! Each filter returns a [`FilterDecision`]. A chain is walked in insertion
//! order: `Deny` drops the event, `Accept` lets it through without consulting
//! the remaining filters, and `Neutral` moves on. Running off the end of the
//! chain accepts the event.

use super::event::LoggingEvent;
use super::level::Level;
use super::log_context::FieldValue;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Drop the event immediately
    Deny,
    /// No opinion, ask the next filter
    Neutral,
    /// Log the event without asking the remaining filters
    Accept,
}

pub trait Filter: Send + Sync {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision;
}

/// Ordered sequence of filters attached to one appender
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// First filter of the chain
    pub fn head(&self) -> Option<&Arc<dyn Filter>> {
        self.filters.first()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Outcome of the whole chain. Never `Neutral`.
    pub fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        for filter in &self.filters {
            match filter.decide(event) {
                FilterDecision::Neutral => continue,
                decision => return decision,
            }
        }
        FilterDecision::Accept
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

fn on_match(accept_on_match: bool) -> FilterDecision {
    if accept_on_match {
        FilterDecision::Accept
    } else {
        FilterDecision::Deny
    }
}

/// Matches events of exactly one level
#[derive(Debug, Clone)]
pub struct LevelMatchFilter {
    level: Level,
    accept_on_match: bool,
}

impl LevelMatchFilter {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            accept_on_match: true,
        }
    }

    #[must_use]
    pub fn accept_on_match(mut self, accept: bool) -> Self {
        self.accept_on_match = accept;
        self
    }
}

impl Filter for LevelMatchFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        if event.level() == &self.level {
            on_match(self.accept_on_match)
        } else {
            FilterDecision::Neutral
        }
    }
}

/// Denies events outside `[min, max]`.
///
/// Events inside the range are accepted when `accept_on_match` is set and
/// otherwise left to the next filter.
#[derive(Debug, Clone)]
pub struct LevelRangeFilter {
    min: Option<Level>,
    max: Option<Level>,
    accept_on_match: bool,
}

impl LevelRangeFilter {
    pub fn new(min: Option<Level>, max: Option<Level>) -> Self {
        Self {
            min,
            max,
            accept_on_match: false,
        }
    }

    #[must_use]
    pub fn accept_on_match(mut self, accept: bool) -> Self {
        self.accept_on_match = accept;
        self
    }
}

impl Filter for LevelRangeFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        let level = event.level();
        if let Some(min) = &self.min {
            if !level.is_as_severe_as(min) {
                return FilterDecision::Deny;
            }
        }
        if let Some(max) = &self.max {
            if level.rank() > max.rank() {
                return FilterDecision::Deny;
            }
        }
        if self.accept_on_match {
            FilterDecision::Accept
        } else {
            FilterDecision::Neutral
        }
    }
}

/// Matches events whose rendered message contains a substring
#[derive(Debug, Clone)]
pub struct StringMatchFilter {
    needle: String,
    accept_on_match: bool,
}

impl StringMatchFilter {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            accept_on_match: true,
        }
    }

    #[must_use]
    pub fn accept_on_match(mut self, accept: bool) -> Self {
        self.accept_on_match = accept;
        self
    }
}

impl Filter for StringMatchFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        if self.needle.is_empty() {
            return FilterDecision::Neutral;
        }
        if event.rendered_message().contains(&self.needle) {
            on_match(self.accept_on_match)
        } else {
            FilterDecision::Neutral
        }
    }
}

/// Matches events whose mapped diagnostic context holds `key = value`
#[derive(Debug, Clone)]
pub struct MdcMatchFilter {
    key: String,
    value: FieldValue,
    accept_on_match: bool,
}

impl MdcMatchFilter {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            accept_on_match: true,
        }
    }

    #[must_use]
    pub fn accept_on_match(mut self, accept: bool) -> Self {
        self.accept_on_match = accept;
        self
    }
}

impl Filter for MdcMatchFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        match event.mdc_value(&self.key) {
            Some(value) if value == &self.value => on_match(self.accept_on_match),
            _ => FilterDecision::Neutral,
        }
    }
}

/// Matches events from a logger or any of its descendants
#[derive(Debug, Clone)]
pub struct LoggerNameFilter {
    prefix: String,
    accept_on_match: bool,
}

impl LoggerNameFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            accept_on_match: true,
        }
    }

    #[must_use]
    pub fn accept_on_match(mut self, accept: bool) -> Self {
        self.accept_on_match = accept;
        self
    }
}

impl Filter for LoggerNameFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        let name = event.logger_name();
        let matches = name == self.prefix
            || (name.starts_with(&self.prefix)
                && name.as_bytes().get(self.prefix.len()) == Some(&b'.'));
        if matches {
            on_match(self.accept_on_match)
        } else {
            FilterDecision::Neutral
        }
    }
}

/// Denies everything; placed last to turn a chain into an allow-list
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllFilter;

impl Filter for DenyAllFilter {
    fn decide(&self, _event: &LoggingEvent) -> FilterDecision {
        FilterDecision::Deny
    }
}

/// Filter backed by a closure
pub struct CustomFilter {
    f: Box<dyn Fn(&LoggingEvent) -> FilterDecision + Send + Sync>,
}

impl CustomFilter {
    pub fn new(f: impl Fn(&LoggingEvent) -> FilterDecision + Send + Sync + 'static) -> Self {
        Self { f: Box::new(f) }
    }
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFilter").finish_non_exhaustive()
    }
}

impl Filter for CustomFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        (self.f)(event)
    }
}
