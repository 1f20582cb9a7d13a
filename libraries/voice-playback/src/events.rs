//! Playback Events
//!
//! Notifications for the chat layer. Events are emitted at key points:
//! - A track starts streaming or is queued
//! - A stream finishes or a queued track fails to start
//! - The queue runs dry ("queue finished")
//! - Stop / pause / resume / loop changes
//!
//! Events are broadcast; a slow subscriber lags and loses old events instead
//! of blocking tenant workers.

use crate::types::{TenantId, Track};
use serde::Serialize;
use std::sync::Arc;

/// Events emitted by tenant workers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// A stream started for `track`
    NowPlaying {
        tenant: TenantId,
        track: Arc<Track>,
    },

    /// `track` was appended to the queue at `position` (1-based)
    Queued {
        tenant: TenantId,
        track: Arc<Track>,
        position: usize,
    },

    /// The stream for `track` reached its end
    TrackFinished {
        tenant: TenantId,
        track: Arc<Track>,
    },

    /// A dequeued track could not be started and was dropped
    TrackFailed {
        tenant: TenantId,
        track: Arc<Track>,
        reason: String,
    },

    /// Nothing left to play, the tenant is idle
    QueueFinished { tenant: TenantId },

    /// Playback stopped by command
    Stopped { tenant: TenantId },

    Paused { tenant: TenantId },

    Resumed { tenant: TenantId },

    /// Loop mode changed
    LoopChanged { tenant: TenantId, enabled: bool },
}

impl PlaybackEvent {
    /// Tenant the event belongs to
    pub fn tenant(&self) -> TenantId {
        match self {
            PlaybackEvent::NowPlaying { tenant, .. }
            | PlaybackEvent::Queued { tenant, .. }
            | PlaybackEvent::TrackFinished { tenant, .. }
            | PlaybackEvent::TrackFailed { tenant, .. }
            | PlaybackEvent::QueueFinished { tenant }
            | PlaybackEvent::Stopped { tenant }
            | PlaybackEvent::Paused { tenant }
            | PlaybackEvent::Resumed { tenant }
            | PlaybackEvent::LoopChanged { tenant, .. } => *tenant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() {
        let event = PlaybackEvent::QueueFinished {
            tenant: TenantId::new(7),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "queue_finished");
        assert_eq!(json["tenant"], 7);
    }

    #[test]
    fn tenant_accessor() {
        let event = PlaybackEvent::LoopChanged {
            tenant: TenantId::new(42),
            enabled: true,
        };
        assert_eq!(event.tenant(), TenantId::new(42));
    }
}
