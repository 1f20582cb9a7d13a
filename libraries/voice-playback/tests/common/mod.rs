//! Shared test doubles for controller integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_playback::{
    EngineError, PlaybackConfig, PlaybackController, QueueListing, SourceError, StreamEngine,
    StreamHandle, TenantId, Track, TrackRequest, TrackSource,
};

/// One call received by the recording engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Start { tenant: TenantId, track_id: String },
    Stop(TenantId),
    Pause(TenantId),
    Resume(TenantId),
    Volume(TenantId, u16),
}

/// Stream engine that records every call and tracks which tenants stream
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    active: Mutex<HashMap<TenantId, StreamHandle>>,
    closed_sessions: Mutex<HashSet<TenantId>>,
    failing_tracks: Mutex<HashSet<String>>,
    start_delays: Mutex<HashMap<TenantId, Duration>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, tenant: TenantId) -> Vec<EngineCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                EngineCall::Start { tenant: t, .. } => *t == tenant,
                EngineCall::Stop(t)
                | EngineCall::Pause(t)
                | EngineCall::Resume(t)
                | EngineCall::Volume(t, _) => *t == tenant,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn starts(&self, tenant: TenantId) -> usize {
        self.calls_for(tenant)
            .iter()
            .filter(|call| matches!(call, EngineCall::Start { .. }))
            .count()
    }

    pub fn stops(&self, tenant: TenantId) -> usize {
        self.calls_for(tenant)
            .iter()
            .filter(|call| matches!(call, EngineCall::Stop(_)))
            .count()
    }

    /// Handle of the stream currently running for the tenant
    pub fn active_handle(&self, tenant: TenantId) -> Option<StreamHandle> {
        self.active.lock().unwrap().get(&tenant).copied()
    }

    pub fn is_active(&self, tenant: TenantId) -> bool {
        self.active_handle(tenant).is_some()
    }

    /// Let the running stream reach its end, returning its handle
    pub fn finish(&self, tenant: TenantId) -> StreamHandle {
        self.active
            .lock()
            .unwrap()
            .remove(&tenant)
            .expect("no active stream to finish")
    }

    pub fn close_session(&self, tenant: TenantId) {
        self.closed_sessions.lock().unwrap().insert(tenant);
    }

    pub fn open_session(&self, tenant: TenantId) {
        self.closed_sessions.lock().unwrap().remove(&tenant);
    }

    /// Starting this track fails with a transient error
    pub fn fail_track(&self, track_id: &str) {
        self.failing_tracks
            .lock()
            .unwrap()
            .insert(track_id.to_string());
    }

    pub fn delay_start(&self, tenant: TenantId, delay: Duration) {
        self.start_delays.lock().unwrap().insert(tenant, delay);
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StreamEngine for RecordingEngine {
    async fn start(&self, tenant: TenantId, track: &Track) -> Result<StreamHandle, EngineError> {
        self.record(EngineCall::Start {
            tenant,
            track_id: track.id.clone(),
        });

        let delay = self.start_delays.lock().unwrap().get(&tenant).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.closed_sessions.lock().unwrap().contains(&tenant) {
            return Err(EngineError::NoActiveVoiceSession(tenant));
        }
        if self.failing_tracks.lock().unwrap().contains(&track.id) {
            return Err(EngineError::Transient(format!("cannot open {}", track.source_url)));
        }

        let handle = StreamHandle::new();
        self.active.lock().unwrap().insert(tenant, handle);
        Ok(handle)
    }

    async fn stop(&self, tenant: TenantId) -> Result<(), EngineError> {
        self.record(EngineCall::Stop(tenant));
        self.active.lock().unwrap().remove(&tenant);
        Ok(())
    }

    async fn pause(&self, tenant: TenantId) -> Result<(), EngineError> {
        self.record(EngineCall::Pause(tenant));
        Ok(())
    }

    async fn resume(&self, tenant: TenantId) -> Result<(), EngineError> {
        self.record(EngineCall::Resume(tenant));
        Ok(())
    }

    async fn set_volume(&self, tenant: TenantId, level: u16) -> Result<(), EngineError> {
        self.record(EngineCall::Volume(tenant, level));
        Ok(())
    }
}

/// Track source resolving every query to a track whose id is the query
#[derive(Default)]
pub struct EchoSource {
    missing: Mutex<HashSet<String>>,
}

impl EchoSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_missing(&self, query: &str) {
        self.missing.lock().unwrap().insert(query.to_string());
    }
}

#[async_trait]
impl TrackSource for EchoSource {
    async fn resolve(&self, request: &TrackRequest) -> Result<Track, SourceError> {
        if self.missing.lock().unwrap().contains(&request.query) {
            return Err(SourceError::NotFound(request.query.clone()));
        }

        Ok(Track {
            id: request.query.clone(),
            title: format!("Title of {}", request.query),
            source_url: format!("https://media.example/{}", request.query),
            duration_seconds: 200,
            requested_by: request.requested_by.clone(),
        })
    }
}

pub struct Harness {
    pub controller: PlaybackController,
    pub engine: Arc<RecordingEngine>,
    pub source: Arc<EchoSource>,
}

pub fn harness() -> Harness {
    harness_with(PlaybackConfig::default())
}

pub fn harness_with(config: PlaybackConfig) -> Harness {
    let engine = RecordingEngine::new();
    let source = EchoSource::new();
    let controller = PlaybackController::new(source.clone(), engine.clone(), config);
    Harness {
        controller,
        engine,
        source,
    }
}

pub fn request(query: &str) -> TrackRequest {
    TrackRequest::new(query, "tester")
}

pub fn pending_ids(listing: &QueueListing) -> Vec<String> {
    listing.pending.iter().map(|t| t.id.clone()).collect()
}

pub fn current_id(listing: &QueueListing) -> Option<String> {
    listing.current.as_ref().map(|t| t.id.clone())
}

/// "current set" iff the engine streams for the tenant
pub fn assert_consistent(listing: &QueueListing, engine: &RecordingEngine, tenant: TenantId) {
    assert_eq!(
        listing.current.is_some(),
        engine.is_active(tenant),
        "current track and engine stream disagree: {:?}",
        listing
    );
}
