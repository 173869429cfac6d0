//! Centralized error types for Thunder Muscle.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the Thunder Muscle library.
#[derive(Error, Debug)]
pub enum TmError {
    /// The Gloda store does not exist at the given location.
    #[error("Gloda database not found at {0}")]
    StoreNotFound(PathBuf),

    /// A regular expression supplied by the operator failed to compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    MalformedPattern {
        pattern: String,
        source: regex::Error,
    },

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The SQLite store could not be opened or queried.
    #[error("Mail store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The requested serialization format is not available for this operation.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience alias for `Result<T, TmError>`.
pub type Result<T> = std::result::Result<T, TmError>;

impl TmError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `MalformedPattern` variant from the offending pattern.
    pub fn pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::MalformedPattern {
            pattern: pattern.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_message() {
        let err = TmError::StoreNotFound(PathBuf::from("/tmp/profile/global-messages-db.sqlite"));
        assert_eq!(
            err.to_string(),
            "Gloda database not found at /tmp/profile/global-messages-db.sqlite"
        );
    }

    #[test]
    fn test_malformed_pattern_message_names_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = TmError::pattern("(", source);
        assert!(err.to_string().starts_with("Invalid pattern '('"));
    }
}
