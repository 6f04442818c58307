//! Console appender implementation

use crate::core::{
    render_event, Append, AppenderSkeleton, Layout, LoggerError, LoggingEvent, Result, TextLayout,
};
#[cfg(feature = "console")]
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

impl FromStr for ConsoleTarget {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" | "system.out" => Ok(ConsoleTarget::Stdout),
            "stderr" | "system.err" => Ok(ConsoleTarget::Stderr),
            other => Err(LoggerError::config(
                "console target",
                format!("expected stdout or stderr, got [{}]", other),
            )),
        }
    }
}

/// Writes formatted events to stdout or stderr
pub struct ConsoleSink {
    target: ConsoleTarget,
    use_colors: bool,
    immediate_flush: bool,
}

impl ConsoleSink {
    pub fn new(target: ConsoleTarget) -> Self {
        Self {
            target,
            use_colors: false,
            immediate_flush: true,
        }
    }

    /// Colour the first line of each event by level (feature `console`)
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn write_str(&self, text: &str) -> Result<()> {
        let result = match self.target {
            ConsoleTarget::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(text.as_bytes()).and_then(|_| {
                    if self.immediate_flush {
                        out.flush()
                    } else {
                        Ok(())
                    }
                })
            }
            ConsoleTarget::Stderr => {
                let mut out = std::io::stderr().lock();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
        };
        result.map_err(|e| LoggerError::io_operation("writing", "console output failed", e))
    }

    #[cfg(feature = "console")]
    fn colorize(&self, event: &LoggingEvent, text: String) -> String {
        if !self.use_colors {
            return text;
        }
        match text.split_once('\n') {
            Some((first, rest)) => format!(
                "{}\n{}",
                first.color(event.level().color_code()),
                rest
            ),
            None => text.color(event.level().color_code()).to_string(),
        }
    }

    #[cfg(not(feature = "console"))]
    fn colorize(&self, _event: &LoggingEvent, text: String) -> String {
        text
    }
}

impl Append for ConsoleSink {
    fn append(&mut self, event: &LoggingEvent, layout: Option<&dyn Layout>) -> Result<()> {
        let layout = layout.ok_or_else(|| LoggerError::writer("console sink has no layout"))?;
        let text = self.colorize(event, render_event(event, layout));
        self.write_str(&text)
    }

    fn activate(&mut self, layout: Option<&dyn Layout>) -> Result<()> {
        if let Some(header) = layout.and_then(|l| l.header()) {
            self.write_str(&format!("{}\n", header))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().flush()?,
            ConsoleTarget::Stderr => std::io::stderr().flush()?,
        }
        Ok(())
    }

    fn close(&mut self, layout: Option<&dyn Layout>) -> Result<()> {
        if let Some(footer) = layout.and_then(|l| l.footer()) {
            self.write_str(&format!("{}\n", footer))?;
        }
        self.flush()
    }

    fn requires_layout(&self) -> bool {
        true
    }
}

pub type ConsoleAppender = AppenderSkeleton<ConsoleSink>;

impl AppenderSkeleton<ConsoleSink> {
    /// Text layout on stdout
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name, ConsoleSink::new(ConsoleTarget::Stdout)).with_layout(TextLayout::new())
    }

    /// Text layout on stderr
    pub fn stderr(name: impl Into<String>) -> Self {
        Self::new(name, ConsoleSink::new(ConsoleTarget::Stderr)).with_layout(TextLayout::new())
    }
}
