/// Server configuration
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use voice_playback::PlaybackConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_engine")]
    pub engine: EngineSettings,

    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Simulated stream engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Playback speed multiplier; 60.0 plays a one-minute track in a second
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Open a voice session on first `start` instead of requiring one
    #[serde(default)]
    pub auto_join_sessions: bool,

    /// Volume of newly opened sessions (1-200)
    #[serde(default = "default_volume")]
    pub default_volume: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `./config.toml` is read if present.
    /// Environment variables override both, e.g. `VOICE_SERVER__PORT=9000` or
    /// `VOICE_PLAYBACK__QUEUE_CAPACITY=20`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (prefixed with VOICE_)
        settings = settings.add_source(
            config::Environment::with_prefix("VOICE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|_| ServerError::Config(format!("Invalid host {:?}", self.server.host)))?;

        let playback = &self.playback;
        if playback.queue_capacity == 0 {
            return Err(ServerError::Config(
                "playback.queue_capacity must be at least 1".to_string(),
            ));
        }
        if playback.max_tenants == 0 {
            return Err(ServerError::Config(
                "playback.max_tenants must be at least 1".to_string(),
            ));
        }
        if playback.resolve_timeout_secs == 0 || playback.engine_timeout_secs == 0 {
            return Err(ServerError::Config(
                "playback timeouts must be at least one second".to_string(),
            ));
        }

        if !(self.engine.speed.is_finite() && self.engine.speed > 0.0) {
            return Err(ServerError::Config(format!(
                "engine.speed must be positive, got {}",
                self.engine.speed
            )));
        }
        if !(1..=200).contains(&self.engine.default_volume) {
            return Err(ServerError::Config(format!(
                "engine.default_volume must be within 1-200, got {}",
                self.engine.default_volume
            )));
        }

        if !self.catalog.path.exists() {
            return Err(ServerError::Config(format!(
                "Catalog not found at {:?}",
                self.catalog.path
            )));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_engine() -> EngineSettings {
    EngineSettings {
        speed: default_speed(),
        auto_join_sessions: false,
        default_volume: default_volume(),
    }
}

fn default_speed() -> f64 {
    1.0
}

fn default_volume() -> u16 {
    100
}

fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        path: default_catalog_path(),
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.toml")
}

impl Default for EngineSettings {
    fn default() -> Self {
        default_engine()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            playback: PlaybackConfig::default(),
            engine: default_engine(),
            catalog: default_catalog(),
        }
    }
}
