use thiserror::Error;

use crate::model::MediaKey;

/// Operation issued to a media controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOperation {
    Play,
    Pause,
}

impl std::fmt::Display for MediaOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaOperation::Play => f.write_str("play"),
            MediaOperation::Pause => f.write_str("pause"),
        }
    }
}

/// Failures seen by the coordinator.
///
/// None of them leave the coordinator: they are logged and dropped.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Raised by a controller implementation (decoder error, player gone)
    #[error("{0}")]
    Controller(String),
    #[error("{operation} on {key} failed: {reason}")]
    MediaOperationFailed {
        key: MediaKey,
        operation: MediaOperation,
        reason: String,
    },
    /// The handle was unregistered or its owner dropped it
    #[error("handle {0} is stale")]
    HandleStale(MediaKey),
}

impl PlaybackError {
    pub fn controller(reason: impl Into<String>) -> Self {
        PlaybackError::Controller(reason.into())
    }

    pub(crate) fn operation_failed(
        key: MediaKey,
        operation: MediaOperation,
        source: PlaybackError,
    ) -> Self {
        PlaybackError::MediaOperationFailed {
            key,
            operation,
            reason: source.to_string(),
        }
    }
}
