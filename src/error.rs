//! Error type shared by configuration, data validation, search and persistence.

use std::fmt;
use std::io;

/// Errors reported by the rule-list learner.
///
/// None of these are retried internally. An interrupted search is not an
/// error: it yields a rule list flagged as uncertified instead.
#[derive(Debug)]
pub enum CorelsError {
    /// Out-of-range or unknown configuration value. Raised before any search state exists.
    Config(String),
    /// Inconsistent data dimensions (ragged rows, label/feature count mismatch).
    Shape(String),
    /// Operation not allowed in the current session or classifier state.
    State(String),
    /// Persisted rule list is incomplete or inconsistent.
    Record(String),
    /// File I/O error.
    Io(io::Error),
    /// Malformed JSON record.
    Json(serde_json::Error),
}

impl CorelsError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CorelsError::Config(msg.into())
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        CorelsError::Shape(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        CorelsError::State(msg.into())
    }

    pub(crate) fn record(msg: impl Into<String>) -> Self {
        CorelsError::Record(msg.into())
    }
}

impl From<io::Error> for CorelsError {
    fn from(e: io::Error) -> Self {
        CorelsError::Io(e)
    }
}

impl From<serde_json::Error> for CorelsError {
    fn from(e: serde_json::Error) -> Self {
        CorelsError::Json(e)
    }
}

impl fmt::Display for CorelsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorelsError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CorelsError::Shape(msg) => write!(f, "Shape error: {}", msg),
            CorelsError::State(msg) => write!(f, "State error: {}", msg),
            CorelsError::Record(msg) => write!(f, "Invalid rule list record: {}", msg),
            CorelsError::Io(e) => write!(f, "I/O error: {}", e),
            CorelsError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for CorelsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CorelsError::Io(e) => Some(e),
            CorelsError::Json(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = CorelsError> = std::result::Result<T, E>;
