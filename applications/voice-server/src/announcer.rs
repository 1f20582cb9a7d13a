//! Logs playback notifications
//!
//! The chat-facing announcements ("now playing", "queue finished", ...) are
//! out of scope for this host; it records them as structured log lines.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use voice_playback::PlaybackEvent;

pub fn spawn_announcer(mut events: broadcast::Receiver<PlaybackEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => announce(&event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Announcer fell behind, skipped events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn announce(event: &PlaybackEvent) {
    let tenant = event.tenant();
    match event {
        PlaybackEvent::NowPlaying { track, .. } => {
            info!(%tenant, title = %track.title, requested_by = %track.requested_by, "Now playing");
        }
        PlaybackEvent::Queued {
            track, position, ..
        } => {
            info!(%tenant, title = %track.title, position, "Added to queue");
        }
        PlaybackEvent::TrackFailed { track, reason, .. } => {
            warn!(%tenant, title = %track.title, %reason, "Track skipped after start failure");
        }
        PlaybackEvent::QueueFinished { .. } => info!(%tenant, "Queue finished"),
        PlaybackEvent::LoopChanged { enabled, .. } => info!(%tenant, enabled, "Loop mode changed"),
        PlaybackEvent::TrackFinished { .. }
        | PlaybackEvent::Stopped { .. }
        | PlaybackEvent::Paused { .. }
        | PlaybackEvent::Resumed { .. } => {
            tracing::debug!(%tenant, ?event, "Playback event");
        }
    }
}
