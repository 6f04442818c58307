//! Layouts turn logging events into text
//!
//! - [`SimpleLayout`]: `LEVEL - message`
//! - [`TextLayout`]: human-readable line with timestamp, thread and logger
//! - [`JsonLayout`]: one JSON object per event
//! - [`LogfmtLayout`]: `key=value` pairs
//!
//! Layouts return a single line without the trailing line separator; sinks
//! add it. A layout that does not render the event's error snapshot reports
//! `ignores_throwable() == true` and the sink prints the snapshot lines itself.

use super::event::LoggingEvent;
use super::log_context::FieldValue;
use super::timestamp::TimestampFormat;

pub trait Layout: Send + Sync {
    fn format(&self, event: &LoggingEvent) -> String;

    /// Text written once when the owning appender is activated
    fn header(&self) -> Option<String> {
        None
    }

    /// Text written once when the owning appender is closed
    fn footer(&self) -> Option<String> {
        None
    }

    fn ignores_throwable(&self) -> bool {
        true
    }

    fn content_type(&self) -> &str {
        "text/plain"
    }
}

/// `LEVEL - message`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleLayout;

impl Layout for SimpleLayout {
    fn format(&self, event: &LoggingEvent) -> String {
        format!("{} - {}", event.level(), event.rendered_message())
    }
}

/// Human-readable single line
///
/// `[2025-01-08T10:30:45.123Z] [INFO ] main com.foo [ndc] - message k=v`
#[derive(Debug, Clone)]
pub struct TextLayout {
    timestamp_format: TimestampFormat,
    location: bool,
    mdc: bool,
    header: Option<String>,
    footer: Option<String>,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self {
            timestamp_format: TimestampFormat::default(),
            location: false,
            mdc: true,
            header: None,
            footer: None,
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Append `module(file:line)` when the event carries a location
    #[must_use]
    pub fn with_location(mut self, enabled: bool) -> Self {
        self.location = enabled;
        self
    }

    /// Include mapped diagnostic context entries after the event fields
    #[must_use]
    pub fn with_mdc(mut self, enabled: bool) -> Self {
        self.mdc = enabled;
        self
    }

    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

impl Layout for TextLayout {
    fn format(&self, event: &LoggingEvent) -> String {
        let mut line = format!(
            "[{}] [{:5}] {} {}",
            self.timestamp_format.format(event.timestamp()),
            event.level(),
            event.thread_name(),
            event.logger_name(),
        );

        if let Some(ndc) = event.ndc() {
            line.push_str(" [");
            line.push_str(ndc);
            line.push(']');
        }

        line.push_str(" - ");
        line.push_str(&sanitize(event.rendered_message()));

        let mut fields = event.fields().clone();
        if self.mdc {
            if let Some(mdc) = event.mdc() {
                fields.merge_missing(mdc);
            }
        }
        if !fields.is_empty() {
            line.push(' ');
            line.push_str(&fields.format_fields());
        }

        if self.location {
            if let Some(location) = event.location() {
                line.push_str(" at ");
                line.push_str(&location.to_string());
            }
        }

        line
    }

    fn header(&self) -> Option<String> {
        self.header.clone()
    }

    fn footer(&self) -> Option<String> {
        self.footer.clone()
    }
}

/// Escape line breaks so one event stays on one line
fn sanitize(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// One JSON object per event
#[derive(Debug, Clone, Default)]
pub struct JsonLayout {
    timestamp_format: TimestampFormat,
    pretty: bool,
}

impl JsonLayout {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn to_value(&self, event: &LoggingEvent) -> serde_json::Value {
        use serde_json::Value;

        let mut obj = serde_json::Map::new();
        obj.insert(
            "timestamp".to_string(),
            self.timestamp_format.to_json(event.timestamp()),
        );
        obj.insert(
            "level".to_string(),
            Value::String(event.level().name().to_string()),
        );
        obj.insert(
            "logger".to_string(),
            Value::String(event.logger_name().to_string()),
        );
        obj.insert(
            "thread".to_string(),
            Value::String(event.thread_name().to_string()),
        );
        obj.insert(
            "message".to_string(),
            Value::String(event.rendered_message().to_string()),
        );

        if let Some(ndc) = event.ndc() {
            obj.insert("ndc".to_string(), Value::String(ndc.to_string()));
        }
        if let Some(mdc) = event.mdc() {
            let map = mdc
                .fields()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_value()))
                .collect();
            obj.insert("mdc".to_string(), Value::Object(map));
        }
        if let Some(location) = event.location() {
            obj.insert("file".to_string(), Value::String(location.file().to_string()));
            obj.insert("line".to_string(), Value::Number(location.line().into()));
            obj.insert(
                "module_path".to_string(),
                Value::String(location.module_path().to_string()),
            );
        }
        if let Some(throwable) = event.throwable() {
            obj.insert(
                "throwable".to_string(),
                Value::Array(
                    throwable
                        .lines()
                        .iter()
                        .map(|line| Value::String(line.clone()))
                        .collect(),
                ),
            );
        }

        // Event fields go last and never overwrite the reserved keys above
        for (key, value) in event.fields().fields() {
            obj.entry(key.clone()).or_insert_with(|| value.to_json_value());
        }

        Value::Object(obj)
    }
}

impl Layout for JsonLayout {
    fn format(&self, event: &LoggingEvent) -> String {
        let value = self.to_value(event);
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.unwrap_or_default()
    }

    fn ignores_throwable(&self) -> bool {
        false
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

/// `key=value` pairs
#[derive(Debug, Clone, Default)]
pub struct LogfmtLayout {
    timestamp_format: TimestampFormat,
}

impl LogfmtLayout {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Layout for LogfmtLayout {
    fn format(&self, event: &LoggingEvent) -> String {
        let mut parts = vec![
            format!(
                "timestamp={}",
                escape_logfmt_value(&self.timestamp_format.format(event.timestamp()))
            ),
            format!("level={}", event.level().name()),
            format!("logger={}", escape_logfmt_value(event.logger_name())),
            format!("thread={}", escape_logfmt_value(event.thread_name())),
            format!("message={}", quote_logfmt_value(event.rendered_message())),
        ];

        if let Some(ndc) = event.ndc() {
            parts.push(format!("ndc={}", quote_logfmt_value(ndc)));
        }

        let mut fields = event.fields().clone();
        if let Some(mdc) = event.mdc() {
            fields.merge_missing(mdc);
        }
        for (key, value) in fields.fields() {
            let formatted = match value {
                FieldValue::String(s) => quote_logfmt_value(s),
                other => other.to_string(),
            };
            parts.push(format!("{}={}", escape_logfmt_key(key), formatted));
        }

        parts.join(" ")
    }
}

fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

fn escape_logfmt_value(value: &str) -> String {
    if value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!(
        "\"{}\"",
        value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostic::{Mdc, Ndc};
    use crate::core::level::Level;
    use crate::core::location::LocationInfo;
    use crate::core::log_context::LogContext;

    fn event() -> LoggingEvent {
        LoggingEvent::new("com.foo.Bar", Level::INFO, "Request processed")
    }

    #[test]
    fn test_simple_layout() {
        assert_eq!(SimpleLayout.format(&event()), "INFO - Request processed");
        assert!(SimpleLayout.ignores_throwable());
    }

    #[test]
    fn test_text_layout_contains_parts() {
        Ndc::clear();
        let event = event()
            .with_fields(LogContext::new().with_field("user_id", 42))
            .with_location(LocationInfo::new("src/bar.rs", 10, "com::foo"));
        let line = TextLayout::new().with_location(true).format(&event);

        assert!(line.contains("[INFO ]"));
        assert!(line.contains("com.foo.Bar - Request processed"));
        assert!(line.contains("user_id=42"));
        assert!(line.ends_with("at com::foo(src/bar.rs:10)"));
    }

    #[test]
    fn test_text_layout_escapes_newlines() {
        let event = LoggingEvent::new("app", Level::INFO, "line one\nERROR fake entry");
        let line = TextLayout::new().format(&event);
        assert!(!line.contains('\n'));
        assert!(line.contains("line one\\nERROR fake entry"));
    }

    #[test]
    fn test_text_layout_includes_ndc_and_mdc() {
        Mdc::clear();
        Ndc::clear();
        let _ndc = Ndc::scoped("req-9");
        let _mdc = Mdc::scoped("tenant", "acme");
        let line = TextLayout::new().format(&event());

        assert!(line.contains("[req-9] - Request processed"));
        assert!(line.contains("tenant=acme"));
    }

    #[test]
    fn test_json_layout() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let event = event()
            .with_error(&err)
            .with_fields(LogContext::new().with_field("latency_ms", 12).with_field("level", "spoof"));
        let parsed: serde_json::Value = serde_json::from_str(&JsonLayout::new().format(&event)).unwrap();

        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["logger"], "com.foo.Bar");
        assert_eq!(parsed["message"], "Request processed");
        assert_eq!(parsed["latency_ms"], 12);
        assert_eq!(parsed["throwable"][0], "boom");
        assert!(parsed["timestamp"].is_string());
        assert!(!JsonLayout::new().ignores_throwable());
    }

    #[test]
    fn test_logfmt_layout() {
        let event = event().with_fields(
            LogContext::new()
                .with_field("query", "SELECT * FROM users WHERE id=1")
                .with_field("count", 5),
        );
        let line = LogfmtLayout::new().format(&event);

        assert!(line.contains("level=INFO"));
        assert!(line.contains("logger=com.foo.Bar"));
        assert!(line.contains("message=\"Request processed\""));
        assert!(line.contains("query=\"SELECT * FROM users WHERE id=1\""));
        assert!(line.contains("count=5"));
    }
}
