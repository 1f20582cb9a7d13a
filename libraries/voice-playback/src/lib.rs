//! Voice Queue - Tenant Playback
//!
//! Multi-tenant playback control for voice-chat streaming.
//!
//! This crate provides:
//! - One bounded FIFO queue per tenant (chat), with loop mode
//! - At most one active stream per tenant
//! - Serialized handling of user commands and asynchronous stream-end events
//! - Typed results for every control operation
//! - Broadcast playback notifications ("now playing", "queue finished", ...)
//!
//! # Architecture
//!
//! `voice-playback` does not decode audio or talk to a chat platform:
//! - Media lookup is a [`TrackSource`]
//! - The voice call itself is a [`StreamEngine`]
//! - Command parsing and message rendering belong to the host
//!
//! Each tenant's state is owned by one tokio task. Commands and stream-end
//! events for that tenant are queued on a single channel and handled one at a
//! time, in order; tenants never wait on each other.
//!
//! # Example: Wiring
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use voice_playback::{
//!     PlaybackConfig, PlaybackController, StreamEnded, StreamEngine, TenantId, TrackRequest,
//!     TrackSource,
//! };
//!
//! # async fn wire(
//! #     source: Arc<dyn TrackSource>,
//! #     make_engine: impl FnOnce(mpsc::UnboundedSender<StreamEnded>) -> Arc<dyn StreamEngine>,
//! # ) -> voice_playback::Result<()> {
//! // The engine reports finished streams on this channel
//! let (ended_tx, ended_rx) = mpsc::unbounded_channel();
//! let engine = make_engine(ended_tx);
//!
//! let controller = PlaybackController::new(source, engine, PlaybackConfig::default());
//! controller.spawn_event_pump(ended_rx);
//!
//! let chat = TenantId::new(-100_123_456);
//! controller.play(chat, TrackRequest::new("never gonna give you up", "rick")).await?;
//! controller.toggle_loop(chat).await?;
//! controller.skip(chat).await?;
//! controller.stop(chat).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod controller;
mod error;
mod events;
mod queue;
mod registry;
mod source;
pub mod types;
mod worker;

// Public exports
pub use config::{PlaybackConfig, DEFAULT_QUEUE_CAPACITY};
pub use controller::{PlayOutcome, PlaybackController, QueueListing, SkipOutcome, StopOutcome};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use queue::{QueueSnapshot, TenantQueue};
pub use registry::{PlaybackRegistry, TenantPlaybackState};
pub use source::{EngineError, SourceError, StreamEnded, StreamEngine, TrackSource};
pub use types::{PlaybackPhase, StreamHandle, TenantId, Track, TrackRequest};
