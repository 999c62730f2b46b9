//! Error types for lifecycle operations.

use crate::config::ConfigError;
use crate::envelope::EnvelopeError;
use crate::history::HistoryError;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle operation result type.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Lifecycle errors.
///
/// Every variant aborts the current operation. Use
/// [`is_user_error`](LifecycleError::is_user_error) to tell bad input apart
/// from environment failures.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Path does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Target or header state is not in the registry
    #[error("Unsupported state '{state}'. Valid states: {}", .valid.join(", "))]
    UnsupportedState { state: String, valid: Vec<String> },

    /// Transition target equals the current state
    #[error("{} is already in state {state}", .path.display())]
    AlreadyInState { path: PathBuf, state: String },

    /// sync-to-header found nothing to move
    #[error("{} is already in the correct directory ({directory})", .path.display())]
    AlreadyInCorrectDirectory { path: PathBuf, directory: String },

    /// No parsable metadata envelope
    #[error("Malformed envelope in {}: {source}", .path.display())]
    MalformedEnvelope {
        path: PathBuf,
        #[source]
        source: EnvelopeError,
    },

    /// Envelope present but without a `state` line
    #[error("Envelope in {} has no 'state' field", .0.display())]
    MissingStateField(PathBuf),

    /// Relocation failed (destination exists, version-control conflict, ...)
    #[error("Failed to move {} to {}: {reason}", .from.display(), .to.display())]
    MoveFailure {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    /// Number already belongs to another document
    #[error("Number {number} of {} is already used by {owner}", .path.display())]
    NumberInUse {
        path: PathBuf,
        number: String,
        owner: String,
    },

    /// Path lies outside the corpus root
    #[error("{} is outside the corpus root {}", .path.display(), .root.display())]
    OutsideCorpus { path: PathBuf, root: PathBuf },

    /// Version-control query failed
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error (file system operations)
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LifecycleError {
    /// Create an IO error tagged with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed envelope error.
    pub fn malformed(path: impl Into<PathBuf>, source: EnvelopeError) -> Self {
        Self::MalformedEnvelope {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::UnsupportedState { .. }
                | Self::AlreadyInState { .. }
                | Self::AlreadyInCorrectDirectory { .. }
                | Self::MalformedEnvelope { .. }
                | Self::MissingStateField(_)
                | Self::NumberInUse { .. }
                | Self::OutsideCorpus { .. }
                | Self::Config(_)
        )
    }
}
