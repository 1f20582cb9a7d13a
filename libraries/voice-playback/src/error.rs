//! Error types for tenant playback

use crate::source::{EngineError, SourceError};
use crate::types::TenantId;
use std::time::Duration;
use thiserror::Error;

/// Playback errors
///
/// Every control operation reports failures through this type; collaborator
/// failures are surfaced here rather than turned into state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The track source found nothing for the query
    #[error("No track found for query: {0}")]
    NotFound(String),

    /// The tenant queue is at capacity
    #[error("Queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The stream engine has no voice session to stream into
    #[error("No active voice session for tenant {0}")]
    NoActiveVoiceSession(TenantId),

    /// The command needs a playing stream
    #[error("Nothing is playing")]
    NothingPlaying,

    /// Network or subprocess failure, the caller may retry
    #[error("Transient error: {0}")]
    Transient(String),

    /// A collaborator call did not finish in time
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Volume outside the accepted range
    #[error("Invalid volume level: {0} (expected 1-200)")]
    InvalidVolume(u16),

    /// The registry refuses to create another tenant
    #[error("Tenant limit reached ({0})")]
    TenantLimitReached(usize),

    /// The tenant worker stopped before answering
    #[error("Playback worker unavailable for tenant {0}")]
    WorkerUnavailable(TenantId),
}

impl From<SourceError> for PlaybackError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(query) => PlaybackError::NotFound(query),
            SourceError::Transient(msg) => PlaybackError::Transient(msg),
        }
    }
}

impl From<EngineError> for PlaybackError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NoActiveVoiceSession(tenant) => PlaybackError::NoActiveVoiceSession(tenant),
            EngineError::Transient(msg) => PlaybackError::Transient(msg),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
