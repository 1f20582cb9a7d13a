//! Per-tenant worker
//!
//! One task per tenant owns that tenant's [`TenantPlaybackState`]. User
//! commands and stream-end events arrive on the same channel and are handled
//! strictly one at a time, in arrival order. Commands for other tenants run in
//! their own workers and never wait on this one.

use crate::config::PlaybackConfig;
use crate::controller::{PlayOutcome, QueueListing, SkipOutcome, StopOutcome};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::registry::{PlaybackRegistry, TenantPlaybackState};
use crate::source::{EngineError, StreamEngine, TrackSource};
use crate::types::{StreamHandle, TenantId, Track, TrackRequest};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// Everything a tenant worker receives
#[derive(Debug)]
pub(crate) enum TenantMessage {
    Command(Command),

    /// The engine reports that the stream with this handle ended
    StreamEnded(StreamHandle),
}

#[derive(Debug)]
pub(crate) enum Command {
    Play {
        request: TrackRequest,
        reply: Reply<PlayOutcome>,
    },
    Skip {
        reply: Reply<SkipOutcome>,
    },
    Stop {
        reply: Reply<StopOutcome>,
    },
    Pause {
        reply: Reply<()>,
    },
    Resume {
        reply: Reply<()>,
    },
    ToggleLoop {
        reply: Reply<bool>,
    },
    SetVolume {
        level: u16,
        reply: Reply<()>,
    },
    ListQueue {
        limit: usize,
        reply: Reply<QueueListing>,
    },
    ClearQueue {
        reply: Reply<usize>,
    },
}

/// State shared by the controller and all tenant workers
pub(crate) struct Shared {
    pub registry: PlaybackRegistry,
    pub source: Arc<dyn TrackSource>,
    pub engine: Arc<dyn StreamEngine>,
    pub config: PlaybackConfig,
    pub events: broadcast::Sender<PlaybackEvent>,
}

/// Why the worker is moving to the next track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdvanceCause {
    StreamEnded,
    Skip,
}

pub(crate) struct TenantWorker {
    tenant: TenantId,
    state: TenantPlaybackState,
    shared: Arc<Shared>,
    inbox: mpsc::UnboundedReceiver<TenantMessage>,
}

impl TenantWorker {
    /// Start a worker for `tenant`, returning its inbox sender
    pub(crate) fn spawn(shared: Arc<Shared>, tenant: TenantId) -> mpsc::UnboundedSender<TenantMessage> {
        let (sender, inbox) = mpsc::unbounded_channel();
        let worker = Self {
            tenant,
            state: TenantPlaybackState::new(shared.config.queue_capacity),
            shared: Arc::clone(&shared),
            inbox,
        };
        shared.registry.track(tokio::spawn(worker.run()));
        sender
    }

    async fn run(mut self) {
        debug!(tenant = %self.tenant, "Tenant worker started");

        loop {
            let message = if self.state.is_retirable() {
                let idle = self.shared.config.idle_retire_after();
                let received = tokio::select! {
                    message = self.inbox.recv() => Some(message),
                    () = tokio::time::sleep(idle) => None,
                };

                match received {
                    Some(message) => message,
                    None => match self.shared.registry.retire(self.tenant, &mut self.inbox) {
                        Some(message) => Some(message),
                        None => {
                            debug!(tenant = %self.tenant, "Idle tenant worker retired");
                            return;
                        }
                    },
                }
            } else {
                self.inbox.recv().await
            };

            let Some(message) = message else {
                break;
            };

            match message {
                TenantMessage::Command(command) => self.execute(command).await,
                TenantMessage::StreamEnded(handle) => self.on_stream_ended(handle).await,
            }
        }

        // Inbox closed: the controller shut down
        if self.state.is_playing() {
            self.stop_engine().await;
        }
        debug!(tenant = %self.tenant, "Tenant worker stopped");
    }

    async fn execute(&mut self, command: Command) {
        // A caller that stopped waiting drops its receiver; the send error is irrelevant
        match command {
            Command::Play { request, reply } => {
                let _ = reply.send(self.play(request).await);
            }
            Command::Skip { reply } => {
                let _ = reply.send(self.skip().await);
            }
            Command::Stop { reply } => {
                let _ = reply.send(Ok(self.stop().await));
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause().await);
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.resume().await);
            }
            Command::ToggleLoop { reply } => {
                let _ = reply.send(Ok(self.toggle_loop()));
            }
            Command::SetVolume { level, reply } => {
                let _ = reply.send(self.set_volume(level).await);
            }
            Command::ListQueue { limit, reply } => {
                let _ = reply.send(Ok(self.list_queue(limit)));
            }
            Command::ClearQueue { reply } => {
                let _ = reply.send(Ok(self.clear_queue()));
            }
        }
    }

    async fn play(&mut self, request: TrackRequest) -> Result<PlayOutcome> {
        let track = Arc::new(self.resolve(&request).await?);

        if self.state.is_playing() {
            let position = self.state.queue_mut().enqueue(Arc::clone(&track))?;
            info!(tenant = %self.tenant, title = %track.title, position, "Track queued");
            self.emit(PlaybackEvent::Queued {
                tenant: self.tenant,
                track: Arc::clone(&track),
                position,
            });
            return Ok(PlayOutcome::Queued { track, position });
        }

        self.start_playback(Arc::clone(&track)).await?;
        Ok(PlayOutcome::NowPlaying(track))
    }

    async fn resolve(&self, request: &TrackRequest) -> Result<Track> {
        let after = self.shared.config.resolve_timeout();
        match timeout(after, self.shared.source.resolve(request)).await {
            Ok(resolved) => resolved.map_err(|err| {
                debug!(tenant = %self.tenant, query = %request.query, "Resolve failed: {}", err);
                PlaybackError::from(err)
            }),
            Err(_) => {
                warn!(tenant = %self.tenant, query = %request.query, "Resolve timed out after {:?}", after);
                Err(PlaybackError::Timeout {
                    operation: "resolve",
                    after,
                })
            }
        }
    }

    /// Start streaming `track`; on any failure the tenant stays idle
    async fn start_playback(&mut self, track: Arc<Track>) -> Result<()> {
        let after = self.shared.config.engine_timeout();

        match timeout(after, self.shared.engine.start(self.tenant, &track)).await {
            Ok(Ok(handle)) => {
                info!(tenant = %self.tenant, title = %track.title, %handle, "Now playing");
                self.state.begin(Arc::clone(&track), handle);
                self.emit(PlaybackEvent::NowPlaying {
                    tenant: self.tenant,
                    track,
                });
                Ok(())
            }
            Ok(Err(err)) => {
                warn!(tenant = %self.tenant, title = %track.title, "Stream start failed: {}", err);
                Err(err.into())
            }
            Err(_) => {
                warn!(tenant = %self.tenant, title = %track.title, "Stream start timed out after {:?}", after);
                // The engine may still come up late; make sure nothing streams behind our back
                self.stop_engine().await;
                Err(PlaybackError::Timeout {
                    operation: "stream start",
                    after,
                })
            }
        }
    }

    async fn on_stream_ended(&mut self, handle: StreamHandle) {
        if self.state.handle() != Some(handle) {
            debug!(tenant = %self.tenant, %handle, "Ignoring stale stream-end event");
            return;
        }

        let Some(finished) = self.state.finish() else {
            return;
        };
        info!(tenant = %self.tenant, title = %finished.title, "Stream ended");
        self.emit(PlaybackEvent::TrackFinished {
            tenant: self.tenant,
            track: Arc::clone(&finished),
        });

        // Failures were already reported through events; nobody waits on this result
        let _ = self.advance(Some(finished), AdvanceCause::StreamEnded).await;
    }

    /// Move to the next track (or replay `finished` in loop mode)
    ///
    /// After a stream end, a track that fails to start is dropped and the next
    /// one is tried, unless the engine has no voice session or timed out. Then
    /// the tenant stays idle with the rest of the queue kept. On skip the first
    /// failure goes back to the caller.
    async fn advance(
        &mut self,
        mut finished: Option<Arc<Track>>,
        cause: AdvanceCause,
    ) -> Result<Option<Arc<Track>>> {
        loop {
            let Some(next) = self.state.queue_mut().dequeue_next(finished.take()) else {
                info!(tenant = %self.tenant, "Queue finished");
                self.emit(PlaybackEvent::QueueFinished {
                    tenant: self.tenant,
                });
                return Ok(None);
            };

            match self.start_playback(Arc::clone(&next)).await {
                Ok(()) => return Ok(Some(next)),
                Err(err) => {
                    self.emit(PlaybackEvent::TrackFailed {
                        tenant: self.tenant,
                        track: next,
                        reason: err.to_string(),
                    });

                    // A missing session or a hung engine would fail every queued track too
                    if cause == AdvanceCause::Skip
                        || matches!(
                            err,
                            PlaybackError::NoActiveVoiceSession(_) | PlaybackError::Timeout { .. }
                        )
                    {
                        return Err(err);
                    }
                }
            }
        }
    }

    async fn skip(&mut self) -> Result<SkipOutcome> {
        if !self.state.is_playing() {
            return Err(PlaybackError::NothingPlaying);
        }

        self.stop_engine().await;
        if let Some(skipped) = self.state.finish() {
            info!(tenant = %self.tenant, title = %skipped.title, "Skipped");
        }

        // Skip always moves past the current track, even in loop mode
        match self.advance(None, AdvanceCause::Skip).await? {
            Some(track) => Ok(SkipOutcome::Advanced(track)),
            None => Ok(SkipOutcome::QueueEmpty),
        }
    }

    async fn stop(&mut self) -> StopOutcome {
        let was_playing = self.state.is_playing();
        if was_playing {
            self.stop_engine().await;
        }

        let dropped = self.state.queue().len();
        self.state.reset();

        if was_playing || dropped > 0 {
            info!(tenant = %self.tenant, dropped, "Playback stopped");
            self.emit(PlaybackEvent::Stopped {
                tenant: self.tenant,
            });
        }

        StopOutcome::Stopped
    }

    async fn pause(&mut self) -> Result<()> {
        if !self.state.is_playing() {
            return Err(PlaybackError::NothingPlaying);
        }

        self.engine_call("pause", self.shared.engine.pause(self.tenant))
            .await?;
        self.state.set_paused(true);
        self.emit(PlaybackEvent::Paused {
            tenant: self.tenant,
        });
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        if !self.state.is_playing() {
            return Err(PlaybackError::NothingPlaying);
        }

        self.engine_call("resume", self.shared.engine.resume(self.tenant))
            .await?;
        self.state.set_paused(false);
        self.emit(PlaybackEvent::Resumed {
            tenant: self.tenant,
        });
        Ok(())
    }

    async fn set_volume(&mut self, level: u16) -> Result<()> {
        if !self.state.is_playing() {
            return Err(PlaybackError::NothingPlaying);
        }

        self.engine_call("set volume", self.shared.engine.set_volume(self.tenant, level))
            .await?;
        debug!(tenant = %self.tenant, level, "Volume changed");
        Ok(())
    }

    fn toggle_loop(&mut self) -> bool {
        let enabled = self.state.queue_mut().toggle_loop();
        info!(tenant = %self.tenant, enabled, "Loop mode changed");
        self.emit(PlaybackEvent::LoopChanged {
            tenant: self.tenant,
            enabled,
        });
        enabled
    }

    fn list_queue(&self, limit: usize) -> QueueListing {
        let snapshot = self.state.queue().peek_all(limit);
        QueueListing {
            current: self.state.current().cloned(),
            phase: self.state.phase(),
            pending: snapshot.tracks,
            overflow: snapshot.overflow,
            loop_enabled: self.state.queue().loop_enabled(),
            paused: self.state.is_paused(),
        }
    }

    fn clear_queue(&mut self) -> usize {
        let removed = self.state.queue_mut().clear();
        debug!(tenant = %self.tenant, removed, "Queue cleared");
        removed
    }

    /// Ask the engine to stop; failures are logged, the engine contract makes stop idempotent
    async fn stop_engine(&self) {
        if let Err(err) = self
            .engine_call("stream stop", self.shared.engine.stop(self.tenant))
            .await
        {
            warn!(tenant = %self.tenant, "Stopping stream failed: {}", err);
        }
    }

    async fn engine_call<F>(&self, operation: &'static str, call: F) -> Result<()>
    where
        F: Future<Output = std::result::Result<(), EngineError>>,
    {
        let after = self.shared.config.engine_timeout();
        match timeout(after, call).await {
            Ok(result) => result.map_err(PlaybackError::from),
            Err(_) => Err(PlaybackError::Timeout { operation, after }),
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.shared.events.send(event);
    }
}
