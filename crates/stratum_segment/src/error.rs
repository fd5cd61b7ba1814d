//! Error types for segment loading.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised while turning a path into segment metadata.
///
/// Every variant names the offending path so a failure can be diagnosed
/// from the log line alone.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path could not be read.
    #[error("I/O error reading segment {path:?}: {source}")]
    Io {
        /// Path being loaded.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The path does not hold a segment at all.
    #[error("not a segment: {path:?}: {reason}")]
    NotASegment {
        /// Path being loaded.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// A required metadata key is missing.
    #[error("segment {path:?} is missing required property {key:?}")]
    MissingProperty {
        /// Path being loaded.
        path: PathBuf,
        /// The missing key.
        key: String,
    },

    /// A metadata value could not be interpreted.
    #[error("segment {path:?} has invalid value {value:?} for {key:?}")]
    InvalidProperty {
        /// Path being loaded.
        path: PathBuf,
        /// The offending key.
        key: String,
        /// The raw value.
        value: String,
    },

    /// The metadata file is structurally broken.
    #[error("malformed segment metadata in {path:?}: {message}")]
    Malformed {
        /// Path being loaded.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },
}

impl LoadError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a not-a-segment error.
    pub fn not_a_segment(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::NotASegment {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed-metadata error.
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the path that failed to load.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. }
            | Self::NotASegment { path, .. }
            | Self::MissingProperty { path, .. }
            | Self::InvalidProperty { path, .. }
            | Self::Malformed { path, .. } => path,
        }
    }
}
