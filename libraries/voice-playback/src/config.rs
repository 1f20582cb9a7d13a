//! Playback controller configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default pending-track capacity per tenant
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum pending tracks per tenant (default: 50)
    pub queue_capacity: usize,

    /// Tracks shown by `list_queue` when the caller gives no limit (default: 10)
    pub display_limit: usize,

    /// Upper bound for `TrackSource::resolve` (default: 15s)
    pub resolve_timeout_secs: u64,

    /// Upper bound for each `StreamEngine` call (default: 10s)
    pub engine_timeout_secs: u64,

    /// Maximum number of live tenants (default: 10 000)
    pub max_tenants: usize,

    /// Idle time after which an idle, empty tenant is dropped (default: 600s)
    pub idle_retire_secs: u64,

    /// Buffered playback events per subscriber (default: 256)
    pub event_capacity: usize,
}

impl PlaybackConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }

    pub fn idle_retire_after(&self) -> Duration {
        Duration::from_secs(self.idle_retire_secs)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            display_limit: 10,
            resolve_timeout_secs: 15,
            engine_timeout_secs: 10,
            max_tenants: 10_000,
            idle_retire_secs: 600,
            event_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.queue_capacity, 50);
        assert_eq!(config.display_limit, 10);
        assert_eq!(config.resolve_timeout(), Duration::from_secs(15));
        assert_eq!(config.engine_timeout(), Duration::from_secs(10));
        assert_eq!(config.idle_retire_after(), Duration::from_secs(600));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{ "queue_capacity": 5 }"#).unwrap();
        assert_eq!(config.queue_capacity, 5);
        assert_eq!(config.max_tenants, 10_000);
    }
}
