/// Shared application state
use crate::config::EngineSettings;
use crate::engine::SimulatedStreamEngine;
use std::sync::Arc;
use tokio::sync::mpsc;
use voice_playback::{PlaybackConfig, PlaybackController, StreamEngine, TrackSource};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: PlaybackController,
    pub engine: Arc<SimulatedStreamEngine>,
}

impl AppState {
    /// Wire a controller to a fresh simulated engine
    ///
    /// Spawns the task that forwards the engine's stream-end reports, so this
    /// must run inside a tokio runtime.
    pub fn new(
        source: Arc<dyn TrackSource>,
        engine: &EngineSettings,
        playback: PlaybackConfig,
    ) -> Self {
        let (ended_tx, ended_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(SimulatedStreamEngine::new(engine, ended_tx));
        let stream_engine: Arc<dyn StreamEngine> = Arc::clone(&engine) as Arc<dyn StreamEngine>;
        let controller = PlaybackController::new(source, stream_engine, playback);
        controller.spawn_event_pump(ended_rx);

        Self { controller, engine }
    }
}
