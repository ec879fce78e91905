//! Error types for matching and gathering operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or evaluating a path matcher.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A regular expression failed to compile.
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The external tool a matcher delegates to is not on the search path.
    #[error("{tool} not found in PATH")]
    ToolNotAvailable { tool: String },

    /// The external tool ran but reported an unexpected failure.
    #[error("{tool} failed in {path}: {message}")]
    ExternalTool {
        tool: String,
        path: PathBuf,
        message: String,
    },

    /// The external tool could not be spawned or its pipes failed.
    #[error("I/O error running {tool}: {source}")]
    ToolIo {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

impl MatchError {
    /// Whether this error only means an optional tool is missing.
    pub fn is_tool_not_available(&self) -> bool {
        matches!(self, Self::ToolNotAvailable { .. })
    }
}

/// Errors that abort a gather call.
#[derive(Debug, Error)]
pub enum GatherError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scope is neither a regular file nor a directory.
    #[error("Not a file or directory: {path}")]
    UnsupportedEntry { path: PathBuf },

    /// A matcher failed while evaluating entries under a path.
    #[error("Matcher failed at {path}: {source}")]
    Matcher {
        path: PathBuf,
        #[source]
        source: MatchError,
    },

    /// Invalid configuration, including matcher construction failures.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        #[source]
        source: Option<MatchError>,
    },
}

impl GatherError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Wrap a matcher construction failure.
    pub fn matcher_setup(message: impl Into<String>, source: MatchError) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            source: Some(source),
        }
    }
}
