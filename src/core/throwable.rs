//! Snapshot of an error attached to a logging event
//!
//! Events hold the rendered text of an error and its `source()` chain rather
//! than the error itself, so they can cross thread boundaries and be
//! serialized.

use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowableInformation {
    lines: Vec<String>,
}

impl ThrowableInformation {
    /// Render `error` followed by one `Caused by:` line per source.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut lines = vec![error.to_string()];
        let mut source = error.source();
        while let Some(cause) = source {
            lines.push(format!("Caused by: {}", cause));
            source = cause.source();
        }
        Self { lines }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}
