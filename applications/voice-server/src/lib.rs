//! Voice Server Library
//!
//! HTTP host for the `voice-playback` controller: a TOML track catalog, a
//! simulated stream engine and per-tenant control routes.
//!
//! This library exposes the core components for testing purposes.

pub mod announcer;
pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;

// Re-export commonly used types for convenience
pub use catalog::{CatalogEntry, CatalogTrackSource};
pub use config::{CatalogSettings, EngineSettings, ServerConfig, ServerSettings};
pub use engine::{SessionInfo, SimulatedStreamEngine};
pub use error::{Result, ServerError};
pub use state::AppState;
