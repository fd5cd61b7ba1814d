//! Error types for the data managers.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in data manager operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration is malformed or incomplete.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// A segment could not be loaded.
    #[error("load error: {0}")]
    Load(#[from] stratum_segment::LoadError),

    /// The operation is not supported by this data manager.
    ///
    /// This is a permanent condition; callers must not retry.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The operation is not permitted in the current lifecycle stage.
    #[error("illegal state: {message}")]
    IllegalState {
        /// Description of why the operation is not permitted.
        message: String,
    },

    /// The caller passed a value the operation cannot accept.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected value.
        message: String,
    },

    /// Another process holds the data directory.
    #[error("data directory locked: {path:?} is in use by another process")]
    DataDirLocked {
        /// The locked directory.
        path: PathBuf,
    },

    /// Segment storage error.
    #[error("storage error: {0}")]
    Storage(#[from] stratum_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an illegal state error.
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Returns true for [`CoreError::Unsupported`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Returns true for [`CoreError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns true for [`CoreError::IllegalState`].
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState { .. })
    }
}
