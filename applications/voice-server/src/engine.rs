//! Simulated stream engine
//!
//! Stands in for a real voice-call client. A tenant needs an open voice
//! session before anything can stream; a "stream" is a timer that runs for the
//! track's duration (divided by the configured speed) and then reports
//! [`StreamEnded`] on the engine's channel. Tracks of unknown length
//! (`duration_seconds == 0`) are live and run until stopped.

use crate::config::EngineSettings;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use voice_playback::{EngineError, StreamEnded, StreamEngine, StreamHandle, TenantId, Track};

type Sessions = Arc<Mutex<HashMap<TenantId, Session>>>;

struct ActiveStream {
    handle: StreamHandle,
    track_id: String,
    /// Playback time left as of `resumed_at`; `None` for live streams
    remaining: Option<Duration>,
    resumed_at: Instant,
    paused: bool,
    /// `None` while paused and for live streams
    timer: Option<JoinHandle<()>>,
}

impl ActiveStream {
    fn cancel(mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Session {
    volume: u16,
    stream: Option<ActiveStream>,
}

/// Snapshot of one voice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub volume: u16,
    pub track_id: Option<String>,
    pub handle: Option<StreamHandle>,
    pub paused: bool,
}

pub struct SimulatedStreamEngine {
    sessions: Sessions,
    ended: mpsc::UnboundedSender<StreamEnded>,
    speed: f64,
    auto_join: bool,
    default_volume: u16,
}

fn lock(sessions: &Mutex<HashMap<TenantId, Session>>) -> MutexGuard<'_, HashMap<TenantId, Session>> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SimulatedStreamEngine {
    /// Create an engine reporting finished streams on `ended`
    pub fn new(settings: &EngineSettings, ended: mpsc::UnboundedSender<StreamEnded>) -> Self {
        let speed = if settings.speed.is_finite() && settings.speed > 0.0 {
            settings.speed
        } else {
            1.0
        };

        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ended,
            speed,
            auto_join: settings.auto_join_sessions,
            default_volume: settings.default_volume,
        }
    }

    /// Join the tenant's voice chat; returns false if already joined
    pub fn open_session(&self, tenant: TenantId) -> bool {
        match lock(&self.sessions).entry(tenant) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                info!(%tenant, "Voice session opened");
                entry.insert(Session {
                    volume: self.default_volume,
                    stream: None,
                });
                true
            }
        }
    }

    /// Leave the tenant's voice chat
    ///
    /// A running stream is cut and reported as ended. Returns false if there
    /// was no session.
    pub fn close_session(&self, tenant: TenantId) -> bool {
        let Some(session) = lock(&self.sessions).remove(&tenant) else {
            return false;
        };
        info!(%tenant, "Voice session closed");

        if let Some(stream) = session.stream {
            let handle = stream.handle;
            stream.cancel();
            let _ = self.ended.send(StreamEnded { tenant, handle });
        }
        true
    }

    pub fn session(&self, tenant: TenantId) -> Option<SessionInfo> {
        lock(&self.sessions).get(&tenant).map(|session| SessionInfo {
            volume: session.volume,
            track_id: session.stream.as_ref().map(|s| s.track_id.clone()),
            handle: session.stream.as_ref().map(|s| s.handle),
            paused: session.stream.as_ref().is_some_and(|s| s.paused),
        })
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Wall-clock time a track of `duration` takes at the configured speed
    pub fn scaled(&self, duration: Duration) -> Duration {
        Duration::try_from_secs_f64(duration.as_secs_f64() / self.speed).unwrap_or(Duration::MAX)
    }

    /// Report `handle` as ended after `after`, unless it was replaced or stopped first
    fn spawn_timer(&self, tenant: TenantId, handle: StreamHandle, after: Duration) -> JoinHandle<()> {
        let sessions = Arc::clone(&self.sessions);
        let ended = self.ended.clone();

        tokio::spawn(async move {
            tokio::time::sleep(after).await;

            // Checked under the lock so a concurrent stop or start wins
            let finished = match lock(&sessions).get_mut(&tenant) {
                Some(session) if session.stream.as_ref().is_some_and(|s| s.handle == handle) => {
                    session.stream = None;
                    true
                }
                _ => false,
            };

            if finished {
                debug!(%tenant, %handle, "Simulated stream reached its end");
                let _ = ended.send(StreamEnded { tenant, handle });
            }
        })
    }
}

#[async_trait]
impl StreamEngine for SimulatedStreamEngine {
    async fn start(&self, tenant: TenantId, track: &Track) -> Result<StreamHandle, EngineError> {
        let mut sessions = lock(&self.sessions);
        let session = match sessions.entry(tenant) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) if self.auto_join => {
                info!(%tenant, "Voice session opened on demand");
                entry.insert(Session {
                    volume: self.default_volume,
                    stream: None,
                })
            }
            Entry::Vacant(_) => return Err(EngineError::NoActiveVoiceSession(tenant)),
        };

        if let Some(previous) = session.stream.take() {
            previous.cancel();
        }

        let handle = StreamHandle::new();
        let remaining = (track.duration_seconds > 0).then(|| self.scaled(track.duration()));
        session.stream = Some(ActiveStream {
            handle,
            track_id: track.id.clone(),
            remaining,
            resumed_at: Instant::now(),
            paused: false,
            timer: remaining.map(|after| self.spawn_timer(tenant, handle, after)),
        });

        debug!(%tenant, %handle, track = %track.id, ?remaining, "Simulated stream started");
        Ok(handle)
    }

    async fn stop(&self, tenant: TenantId) -> Result<(), EngineError> {
        let stream = lock(&self.sessions)
            .get_mut(&tenant)
            .and_then(|session| session.stream.take());

        if let Some(stream) = stream {
            debug!(%tenant, handle = %stream.handle, "Simulated stream stopped");
            stream.cancel();
        }
        Ok(())
    }

    async fn pause(&self, tenant: TenantId) -> Result<(), EngineError> {
        let mut sessions = lock(&self.sessions);
        let stream = active_stream(&mut sessions, tenant)?;

        if !stream.paused {
            stream.paused = true;
            if let Some(timer) = stream.timer.take() {
                timer.abort();
            }
            if let Some(remaining) = stream.remaining.as_mut() {
                *remaining = remaining.saturating_sub(stream.resumed_at.elapsed());
            }
        }
        Ok(())
    }

    async fn resume(&self, tenant: TenantId) -> Result<(), EngineError> {
        let mut sessions = lock(&self.sessions);
        let stream = active_stream(&mut sessions, tenant)?;

        if stream.paused {
            let handle = stream.handle;
            stream.paused = false;
            stream.resumed_at = Instant::now();
            stream.timer = stream
                .remaining
                .map(|after| self.spawn_timer(tenant, handle, after));
        }
        Ok(())
    }

    async fn set_volume(&self, tenant: TenantId, level: u16) -> Result<(), EngineError> {
        let mut sessions = lock(&self.sessions);
        let session = sessions
            .get_mut(&tenant)
            .ok_or(EngineError::NoActiveVoiceSession(tenant))?;
        session.volume = level;
        Ok(())
    }
}

fn active_stream(
    sessions: &mut HashMap<TenantId, Session>,
    tenant: TenantId,
) -> Result<&mut ActiveStream, EngineError> {
    sessions
        .get_mut(&tenant)
        .ok_or(EngineError::NoActiveVoiceSession(tenant))?
        .stream
        .as_mut()
        .ok_or_else(|| EngineError::Transient("nothing is streaming".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(seconds: u64) -> Track {
        Track {
            id: "t".to_string(),
            title: "Test".to_string(),
            source_url: "https://media.example/t".to_string(),
            duration_seconds: seconds,
            requested_by: "tester".to_string(),
        }
    }

    fn engine(auto_join: bool) -> (SimulatedStreamEngine, mpsc::UnboundedReceiver<StreamEnded>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = EngineSettings {
            auto_join_sessions: auto_join,
            ..EngineSettings::default()
        };
        (SimulatedStreamEngine::new(&settings, tx), rx)
    }

    const T: TenantId = TenantId::new(7);

    #[tokio::test]
    async fn start_requires_session() {
        let (engine, _rx) = engine(false);
        assert_eq!(
            engine.start(T, &track(10)).await.unwrap_err(),
            EngineError::NoActiveVoiceSession(T)
        );

        assert!(engine.open_session(T));
        assert!(!engine.open_session(T));
        engine.start(T, &track(10)).await.unwrap();
    }

    #[tokio::test]
    async fn auto_join_opens_session() {
        let (engine, _rx) = engine(true);
        engine.start(T, &track(10)).await.unwrap();
        assert_eq!(engine.session_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_end_is_reported_after_duration() {
        let (engine, mut rx) = engine(true);
        let handle = engine.start(T, &track(30)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(rx.try_recv().is_err());

        let ended = rx.recv().await.unwrap();
        assert_eq!(ended, StreamEnded { tenant: T, handle });
        assert_eq!(engine.session(T).unwrap().track_id, None);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_stream_never_reports_end() {
        let (engine, mut rx) = engine(true);
        engine.start(T, &track(5)).await.unwrap();
        engine.stop(T).await.unwrap();
        engine.stop(T).await.unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_remaining_time() {
        let (engine, mut rx) = engine(true);
        let handle = engine.start(T, &track(10)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(4)).await;
        engine.pause(T).await.unwrap();
        assert!(engine.session(T).unwrap().paused);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert!(rx.try_recv().is_err());

        let resumed_at = Instant::now();
        engine.resume(T).await.unwrap();
        let ended = rx.recv().await.unwrap();
        assert_eq!(ended.handle, handle);
        let waited = resumed_at.elapsed();
        assert!(waited >= Duration::from_secs(6) && waited < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn speed_shortens_streams() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let settings = EngineSettings {
            speed: 60.0,
            auto_join_sessions: true,
            ..EngineSettings::default()
        };
        let engine = SimulatedStreamEngine::new(&settings, tx);
        assert_eq!(engine.scaled(Duration::from_secs(120)), Duration::from_secs(2));

        let started = Instant::now();
        engine.start(T, &track(120)).await.unwrap();
        rx.recv().await.unwrap();
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn live_stream_runs_until_stopped() {
        let (engine, mut rx) = engine(true);
        let handle = engine.start(T, &track(0)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.session(T).unwrap().handle, Some(handle));

        engine.pause(T).await.unwrap();
        assert!(engine.session(T).unwrap().paused);
        engine.resume(T).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(rx.try_recv().is_err());

        engine.stop(T).await.unwrap();
        assert_eq!(engine.session(T).unwrap().handle, None);
    }

    #[tokio::test]
    async fn closing_session_reports_running_stream() {
        let (engine, mut rx) = engine(false);
        engine.open_session(T);
        let handle = engine.start(T, &track(300)).await.unwrap();

        assert!(engine.close_session(T));
        assert_eq!(rx.try_recv().unwrap(), StreamEnded { tenant: T, handle });
        assert!(!engine.close_session(T));
        assert!(engine.session(T).is_none());
    }

    #[tokio::test]
    async fn volume_needs_session() {
        let (engine, _rx) = engine(false);
        assert!(engine.set_volume(T, 50).await.is_err());

        engine.open_session(T);
        engine.set_volume(T, 50).await.unwrap();
        assert_eq!(engine.session(T).unwrap().volume, 50);
    }
}
