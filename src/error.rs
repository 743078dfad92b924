//! Error taxonomy for the question-answering pipeline.
//!
//! Every failure a request can hit is a [`QueryError`] variant. The first group
//! (`Input`, `Schema`, `Generation`, `Execution`, `TimedOut`, `Cancelled`) are gate
//! rejections: they end the current request and nothing else.
//!
//! ```
//! use tabletalk::error::QueryError;
//!
//! fn describe(err: &QueryError) -> &'static str {
//!     match err {
//!         QueryError::Input(_) => "rephrase the question",
//!         QueryError::Schema(_) => "load the table first",
//!         QueryError::Generation(_) => "the model produced something unusable",
//!         _ => "something else went wrong",
//!     }
//! }
//! # assert_eq!(describe(&QueryError::Input("too short".to_owned())), "rephrase the question");
//! ```
//!
//! `From` conversions let `?` lift store, JSON and polars errors into the right
//! category without ceremony.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::Stage;

/// Main error type for tabletalk operations.
#[derive(Debug)]
pub enum QueryError {
    /// The question was empty or too short
    Input(String),

    /// Missing table or column
    Schema(String),

    /// The model produced unusable SQL or an uninterpretable explanation
    Generation(String),

    /// The backing store rejected the generated SQL
    Execution(String),

    /// The analysis cache could not be read or written
    CacheIo { path: PathBuf, source: std::io::Error },

    /// The language-model collaborator failed to answer
    Model(String),

    /// Store failures outside of query execution (introspection, connection)
    Database(String),

    /// CSV ingestion failures
    Ingest(String),

    /// Invalid settings
    Config(String),

    /// Other I/O errors
    Io(std::io::Error),

    /// A bounded stage ran past its deadline
    TimedOut { stage: Stage, after: Duration },

    /// The request was cancelled while in the given stage
    Cancelled(Stage),
}

impl QueryError {
    pub fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheIo {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a pipeline gate rejecting the current request, as
    /// opposed to an environment problem (store, cache, config).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Input(_)
                | Self::Schema(_)
                | Self::Generation(_)
                | Self::Execution(_)
                | Self::TimedOut { .. }
                | Self::Cancelled(_)
        )
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(msg) => write!(f, "Question rejected: {msg}"),
            Self::Schema(msg) => write!(f, "Schema error: {msg}"),
            Self::Generation(msg) => write!(f, "Generation error: {msg}"),
            Self::Execution(msg) => write!(f, "Execution error: {msg}"),
            Self::CacheIo { path, source } => {
                write!(f, "Analysis cache error at {}: {source}", path.display())
            }
            Self::Model(msg) => write!(f, "Language model error: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Ingest(msg) => write!(f, "Ingestion error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::TimedOut { stage, after } => {
                write!(f, "{stage} timed out after {:.1}s", after.as_secs_f64())
            }
            Self::Cancelled(stage) => write!(f, "Request cancelled during {stage}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CacheIo { source, .. } | Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for QueryError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::Ingest(err.to_string())
    }
}

/// Result type alias for tabletalk operations.
pub type Result<T> = std::result::Result<T, QueryError>;
