//! Core types for tenant playback

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Identifies one chat/group with its own independent playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved, playable media reference
///
/// Produced by a [`TrackSource`](crate::TrackSource) and never mutated
/// afterwards. The controller shares tracks as `Arc<Track>` so that loop
/// mode replays the exact same value instead of a re-resolved copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier from the source
    pub id: String,

    /// Display title
    pub title: String,

    /// URL the stream engine pulls audio from
    pub source_url: String,

    /// Track length in whole seconds (0 when unknown, e.g. live streams)
    pub duration_seconds: u64,

    /// Who asked for this track
    pub requested_by: String,
}

impl Track {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }
}

/// What a caller hands to `play`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRequest {
    /// Search text or direct URL
    pub query: String,

    /// Display name of the requesting user
    pub requested_by: String,
}

impl TrackRequest {
    pub fn new(query: impl Into<String>, requested_by: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            requested_by: requested_by.into(),
        }
    }
}

/// Identity of one running stream, issued by the stream engine on `start`
///
/// Stream-end events carry the handle they belong to; an event whose handle
/// no longer matches the tenant's registered one is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamHandle(Uuid);

impl StreamHandle {
    /// Issue a fresh handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StreamHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observable playback phase of a tenant
///
/// The transition between stopping one stream and starting the next happens
/// inside the tenant worker and is never observable from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// Nothing streaming (the queue may still hold tracks)
    Idle,

    /// A stream is running for the current track
    Playing,
}
