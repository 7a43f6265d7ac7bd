//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = AcceptabilityError> = std::result::Result<T, E>;

/// Domain-specific error describing failures while loading corpora, slicing datasets, or
/// checkpointing models.
#[derive(Debug, Error)]
pub enum AcceptabilityError {
    /// A required corpus or vocabulary file does not exist.
    #[error("required file {path:?} does not exist")]
    MissingFile {
        /// Path that was expected to exist.
        path: PathBuf,
    },
    /// A dataset index outside `[0, len)` was requested.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Logical dataset length.
        len: usize,
    },
    /// The corpus ran out before the pre-sized token buffer was filled.
    #[error("token stream underfilled: expected {expected} ids, corpus produced {written}")]
    UnderfilledStream {
        /// Pre-computed stream size.
        expected: usize,
        /// Number of ids actually written.
        written: usize,
    },
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An acceptability label could not be interpreted as a number.
    #[error("invalid label: {0:?}")]
    InvalidLabel(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// A checkpoint collaborator could not save or restore.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AcceptabilityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl AcceptabilityError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
