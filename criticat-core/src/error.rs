//! Error types for criticat-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the criticat-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A conversation artifact had an unexpected shape
    #[error("parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A required text-analysis model could not be constructed
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Embedding provider failed on a specific request
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A metric could not be computed for the given messages
    #[error("metric {metric} failed: {message}")]
    Metric { metric: String, message: String },
}

impl Error {
    /// Whether this error reflects a broken environment rather than bad data.
    ///
    /// Fatal errors abort a corpus run; everything else is isolated to the
    /// conversation or metric that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ModelUnavailable(_) | Error::Config(_))
    }
}

/// Result type alias for criticat-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::ModelUnavailable("no embedder".into()).is_fatal());
        assert!(Error::Config("nothing enabled".into()).is_fatal());
        assert!(!Error::Embedding("timeout".into()).is_fatal());
        assert!(!Error::Metric {
            metric: "avg_tokens_ai".into(),
            message: "bad value".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_parse_error_mentions_path() {
        let err = Error::Parse {
            path: PathBuf::from("data/A01/messages.json"),
            message: "unexpected JSON structure".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("data/A01/messages.json"));
        assert!(rendered.contains("unexpected JSON structure"));
    }
}
