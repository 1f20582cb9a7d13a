//! Collaborator traits
//!
//! The controller never resolves media or touches a voice call itself. Hosts
//! plug in a [`TrackSource`] (query -> playable track) and a [`StreamEngine`]
//! (joins the call and streams into it). The engine reports finished streams
//! back as [`StreamEnded`] messages, see
//! [`PlaybackController::spawn_event_pump`](crate::PlaybackController::spawn_event_pump).

use crate::types::{StreamHandle, TenantId, Track, TrackRequest};
use async_trait::async_trait;
use thiserror::Error;

/// Track source errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Nothing matched the query
    #[error("No result for query: {0}")]
    NotFound(String),

    /// Lookup failed for a reason worth retrying
    #[error("Source lookup failed: {0}")]
    Transient(String),
}

/// Stream engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No voice call is running in the tenant's chat
    #[error("No active voice session for tenant {0}")]
    NoActiveVoiceSession(TenantId),

    /// Network or subprocess failure
    #[error("Stream engine failure: {0}")]
    Transient(String),
}

/// Resolves a user query to a streamable track
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Resolve a query (search text or URL)
    ///
    /// The returned track carries `request.requested_by`.
    async fn resolve(&self, request: &TrackRequest) -> Result<Track, SourceError>;
}

/// Transmits audio into a tenant's live call session
///
/// Implementations must deliver at most one [`StreamEnded`] per handle they
/// issue. Delivery is not guaranteed (an engine crash may lose it); callers
/// keep `skip` as the manual way forward.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamEngine: Send + Sync {
    /// Start streaming `track` into the tenant's call, replacing anything
    /// currently streaming there
    async fn start(&self, tenant: TenantId, track: &Track) -> Result<StreamHandle, EngineError>;

    /// Stop streaming for the tenant; idempotent
    async fn stop(&self, tenant: TenantId) -> Result<(), EngineError>;

    /// Pause the running stream
    async fn pause(&self, tenant: TenantId) -> Result<(), EngineError>;

    /// Resume a paused stream
    async fn resume(&self, tenant: TenantId) -> Result<(), EngineError>;

    /// Set output volume (1-200, 100 = unchanged)
    async fn set_volume(&self, tenant: TenantId, level: u16) -> Result<(), EngineError>;
}

/// Asynchronous "stream ended" notification from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEnded {
    pub tenant: TenantId,
    pub handle: StreamHandle,
}
