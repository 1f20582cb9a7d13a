//! Playback controller - public control API
//!
//! Routes every command and stream-end event to the owning tenant worker and
//! waits for the answer. See [`crate::worker`] for the state machine itself.

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::registry::PlaybackRegistry;
use crate::source::{StreamEnded, StreamEngine, TrackSource};
use crate::types::{PlaybackPhase, StreamHandle, TenantId, Track, TrackRequest};
use crate::worker::{Command, Reply, Shared, TenantMessage, TenantWorker};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of `play`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Nothing was playing; the track started immediately
    NowPlaying(Arc<Track>),

    /// Something is playing; the track waits at `position` (1-based)
    Queued { track: Arc<Track>, position: usize },
}

impl PlayOutcome {
    pub fn track(&self) -> &Arc<Track> {
        match self {
            PlayOutcome::NowPlaying(track) | PlayOutcome::Queued { track, .. } => track,
        }
    }
}

/// Result of `skip`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    /// The next queued track is now playing
    Advanced(Arc<Track>),

    /// Nothing left; the tenant is idle
    QueueEmpty,
}

/// Result of `stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
}

/// Read-only view of a tenant for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueListing {
    pub current: Option<Arc<Track>>,
    pub phase: PlaybackPhase,
    pub pending: Vec<Arc<Track>>,
    /// Pending tracks beyond the requested limit
    pub overflow: usize,
    pub loop_enabled: bool,
    pub paused: bool,
}

impl QueueListing {
    fn empty() -> Self {
        Self {
            current: None,
            phase: PlaybackPhase::Idle,
            pending: Vec::new(),
            overflow: 0,
            loop_enabled: false,
            paused: false,
        }
    }

    /// Total pending tracks, shown or not
    pub fn pending_total(&self) -> usize {
        self.pending.len() + self.overflow
    }
}

/// Multi-tenant playback controller
///
/// Cheap to clone; all clones drive the same tenants.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_playback::{
///     PlaybackConfig, PlaybackController, PlayOutcome, StreamEngine, TenantId, TrackRequest,
///     TrackSource,
/// };
///
/// # async fn demo(source: Arc<dyn TrackSource>, engine: Arc<dyn StreamEngine>,
/// #     ended: tokio::sync::mpsc::UnboundedReceiver<voice_playback::StreamEnded>) -> voice_playback::Result<()> {
/// let controller = PlaybackController::new(source, engine, PlaybackConfig::default());
/// controller.spawn_event_pump(ended);
///
/// let chat = TenantId::new(-100_200_300);
/// match controller.play(chat, TrackRequest::new("lofi beats", "alice")).await? {
///     PlayOutcome::NowPlaying(track) => println!("Now playing {}", track.title),
///     PlayOutcome::Queued { track, position } => println!("#{position}: {}", track.title),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl PlaybackController {
    pub fn new(
        source: Arc<dyn TrackSource>,
        engine: Arc<dyn StreamEngine>,
        config: PlaybackConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                registry: PlaybackRegistry::new(config.max_tenants),
                source,
                engine,
                config,
                events,
            }),
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.shared.config
    }

    pub fn registry(&self) -> &PlaybackRegistry {
        &self.shared.registry
    }

    /// Number of tenants with live state
    pub fn tenant_count(&self) -> usize {
        self.shared.registry.tenant_count()
    }

    /// Receive playback notifications for all tenants
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }

    /// Resolve a request and start it, or queue it behind the running track
    pub async fn play(&self, tenant: TenantId, request: TrackRequest) -> Result<PlayOutcome> {
        self.request(tenant, |reply| Command::Play { request, reply })
            .await
    }

    /// Stop the current track and start the next queued one
    pub async fn skip(&self, tenant: TenantId) -> Result<SkipOutcome> {
        self.request_existing(
            tenant,
            |reply| Command::Skip { reply },
            || Err(PlaybackError::NothingPlaying),
        )
        .await
    }

    /// Stop playback and clear the queue; always succeeds for a reachable tenant
    pub async fn stop(&self, tenant: TenantId) -> Result<StopOutcome> {
        self.request_existing(
            tenant,
            |reply| Command::Stop { reply },
            || Ok(StopOutcome::Stopped),
        )
        .await
    }

    pub async fn pause(&self, tenant: TenantId) -> Result<()> {
        self.request_existing(
            tenant,
            |reply| Command::Pause { reply },
            || Err(PlaybackError::NothingPlaying),
        )
        .await
    }

    pub async fn resume(&self, tenant: TenantId) -> Result<()> {
        self.request_existing(
            tenant,
            |reply| Command::Resume { reply },
            || Err(PlaybackError::NothingPlaying),
        )
        .await
    }

    /// Flip loop mode, returning the new value
    pub async fn toggle_loop(&self, tenant: TenantId) -> Result<bool> {
        self.request(tenant, |reply| Command::ToggleLoop { reply })
            .await
    }

    /// Set stream volume (1-200)
    pub async fn set_volume(&self, tenant: TenantId, level: u16) -> Result<()> {
        if !(1..=200).contains(&level) {
            return Err(PlaybackError::InvalidVolume(level));
        }

        self.request_existing(
            tenant,
            |reply| Command::SetVolume { level, reply },
            || Err(PlaybackError::NothingPlaying),
        )
        .await
    }

    /// Current track plus up to `limit` pending tracks
    ///
    /// `None` uses the configured display limit.
    pub async fn list_queue(&self, tenant: TenantId, limit: Option<usize>) -> Result<QueueListing> {
        let limit = limit.unwrap_or(self.shared.config.display_limit);
        self.request_existing(
            tenant,
            |reply| Command::ListQueue { limit, reply },
            || Ok(QueueListing::empty()),
        )
        .await
    }

    /// Drop pending tracks but keep the current one playing
    pub async fn clear_queue(&self, tenant: TenantId) -> Result<usize> {
        self.request_existing(tenant, |reply| Command::ClearQueue { reply }, || Ok(0))
            .await
    }

    pub async fn now_playing(&self, tenant: TenantId) -> Result<Option<Arc<Track>>> {
        Ok(self.list_queue(tenant, Some(0)).await?.current)
    }

    /// Inbound side of the engine's stream-end notification
    ///
    /// Queued behind any command already waiting for the tenant. Events for
    /// tenants without state are dropped.
    pub fn notify_stream_ended(&self, tenant: TenantId, handle: StreamHandle) {
        if !self
            .shared
            .registry
            .deliver(tenant, TenantMessage::StreamEnded(handle))
        {
            debug!(%tenant, %handle, "Dropping stream-end event for unknown tenant");
        }
    }

    /// Forward every [`StreamEnded`] from an engine channel to its tenant
    pub fn spawn_event_pump(&self, mut ended: mpsc::UnboundedReceiver<StreamEnded>) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(StreamEnded { tenant, handle }) = ended.recv().await {
                controller.notify_stream_ended(tenant, handle);
            }
            debug!("Stream-end channel closed");
        })
    }

    /// Detach all tenant workers and wait for them to exit
    ///
    /// Each worker finishes the messages it already has, stops its stream and
    /// exits. Later commands start from fresh state.
    pub async fn shutdown(&self) {
        let tenants = self.shared.registry.tenant_count();
        let workers = self.shared.registry.clear();
        info!(tenants, "Shutting down playback workers");

        for worker in workers {
            if let Err(err) = worker.await {
                warn!("Tenant worker ended abnormally: {}", err);
            }
        }
    }

    async fn request<T>(
        &self,
        tenant: TenantId,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        self.shared.registry.dispatch(
            tenant,
            TenantMessage::Command(build(reply)),
            || TenantWorker::spawn(shared, tenant),
        )?;

        response
            .await
            .map_err(|_| PlaybackError::WorkerUnavailable(tenant))?
    }

    /// Like `request`, but answers with `absent` instead of creating a tenant
    async fn request_existing<T>(
        &self,
        tenant: TenantId,
        build: impl FnOnce(Reply<T>) -> Command,
        absent: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        if !self
            .shared
            .registry
            .deliver(tenant, TenantMessage::Command(build(reply)))
        {
            return absent();
        }

        response
            .await
            .map_err(|_| PlaybackError::WorkerUnavailable(tenant))?
    }
}
