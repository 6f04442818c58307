//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Append attempted after close
    #[error("Attempted to append to closed appender named [{name}]")]
    AppenderClosed { name: String },

    /// Append attempted before activation or after deactivation
    #[error("Attempted to append to inactive appender named [{name}]")]
    AppenderInactive { name: String },

    /// Appender panicked while writing
    #[error("Appender [{name}] panicked: {message}")]
    AppenderPanicked { name: String, message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Level string that does not name a level
    #[error("Could not convert [{value}] to Level")]
    InvalidLevel { value: String },

    /// Appender, layout or filter kind that cannot be resolved
    #[error("Unknown {category} kind [{kind}]")]
    UnknownKind { category: String, kind: String },

    /// Appender that requires a layout was activated without one
    #[error("No layout set for the appender named [{name}]")]
    MissingLayout { name: String },

    /// File lock error
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Channel receive error
    #[error("Failed to receive acknowledgement from async dispatcher")]
    ChannelReceiveError,

    /// Bounded wait elapsed
    #[error("Timed out after {millis} ms while {operation}")]
    Timeout { operation: String, millis: u128 },

    /// A named repository was asked to take a different name
    #[error("Repository [{current}] cannot be renamed as [{requested}]")]
    RepositoryRenamed { current: String, requested: String },

    /// The process-wide repository selector is already installed
    #[error("Repository selector already installed")]
    SelectorAlreadySet,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn appender_closed(name: impl Into<String>) -> Self {
        LoggerError::AppenderClosed { name: name.into() }
    }

    pub fn appender_inactive(name: impl Into<String>) -> Self {
        LoggerError::AppenderInactive { name: name.into() }
    }

    pub fn appender_panicked(name: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::AppenderPanicked {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn invalid_level(value: impl Into<String>) -> Self {
        LoggerError::InvalidLevel {
            value: value.into(),
        }
    }

    pub fn unknown_kind(category: impl Into<String>, kind: impl Into<String>) -> Self {
        LoggerError::UnknownKind {
            category: category.into(),
            kind: kind.into(),
        }
    }

    pub fn missing_layout(name: impl Into<String>) -> Self {
        LoggerError::MissingLayout { name: name.into() }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        LoggerError::FileLockError { path: path.into() }
    }

    pub fn timeout(operation: impl Into<String>, after: std::time::Duration) -> Self {
        LoggerError::Timeout {
            operation: operation.into(),
            millis: after.as_millis(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::appender_inactive("async");
        assert!(matches!(err, LoggerError::AppenderInactive { .. }));

        let err = LoggerError::config("FileAppender", "Invalid path");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::appender_closed("console");
        assert!(matches!(err, LoggerError::AppenderClosed { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::appender_closed("A1");
        assert_eq!(
            err.to_string(),
            "Attempted to append to closed appender named [A1]"
        );

        let err = LoggerError::invalid_level("LOUD");
        assert_eq!(err.to_string(), "Could not convert [LOUD] to Level");

        let err = LoggerError::RepositoryRenamed {
            current: "app".to_string(),
            requested: "other".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Repository [app] cannot be renamed as [other]"
        );

        let err = LoggerError::timeout("flushing async appender", Duration::from_millis(250));
        assert_eq!(
            err.to_string(),
            "Timed out after 250 ms while flushing async appender"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
