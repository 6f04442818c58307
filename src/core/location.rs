//! Caller location of a log call
//!
//! Captured through `#[track_caller]` on the logger entry points, or from
//! `file!()`/`line!()`/`module_path!()` in the logging macros.

use serde::Serialize;
use std::fmt;
use std::panic::Location;

/// Placeholder printed for unavailable location parts.
pub const NA: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocationInfo {
    file: &'static str,
    line: u32,
    column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    module_path: Option<&'static str>,
}

impl LocationInfo {
    /// Location of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
            module_path: None,
        }
    }

    pub const fn new(file: &'static str, line: u32, module_path: &'static str) -> Self {
        Self {
            file,
            line,
            column: 0,
            module_path: Some(module_path),
        }
    }

    #[must_use]
    pub fn with_module_path(mut self, module_path: &'static str) -> Self {
        self.module_path = Some(module_path);
        self
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn module_path(&self) -> &'static str {
        self.module_path.unwrap_or(NA)
    }
}

impl fmt::Display for LocationInfo {
    /// `module(file:line)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}:{})", self.module_path(), self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn capture() -> LocationInfo {
        LocationInfo::caller()
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let expected_line = line!() + 1;
        let location = capture();
        assert_eq!(location.line(), expected_line);
        assert!(location.file().ends_with("location.rs"));
        assert_eq!(location.module_path(), NA);
    }

    #[test]
    fn test_display() {
        let location = LocationInfo::new("src/main.rs", 12, "app::server");
        assert_eq!(location.to_string(), "app::server(src/main.rs:12)");
    }
}
