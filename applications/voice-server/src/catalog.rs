//! Track catalog backed by a TOML file
//!
//! ```toml
//! [[tracks]]
//! id = "rick"
//! title = "Never Gonna Give You Up"
//! source_url = "https://media.example/rick.opus"
//! duration_seconds = 213
//! ```

use crate::error::{Result, ServerError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use voice_playback::{SourceError, Track, TrackRequest, TrackSource};

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub source_url: String,
    pub duration_seconds: u64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CatalogFile {
    #[serde(default)]
    tracks: Vec<CatalogEntry>,
}

/// [`TrackSource`] that looks queries up in a fixed list of tracks
///
/// Lookup order: exact source URL, exact id, then the first entry whose title
/// contains the query (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct CatalogTrackSource {
    entries: Vec<CatalogEntry>,
}

impl CatalogTrackSource {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| ServerError::Catalog(e.to_string()))?;
        Ok(Self::new(file.tracks))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_toml_str(&content)?;
        info!("Loaded {} catalog tracks from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, query: &str) -> Option<&CatalogEntry> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(entry) = self.entries.iter().find(|e| e.source_url == query) {
            return Some(entry);
        }
        if let Some(entry) = self.entries.iter().find(|e| e.id == query) {
            return Some(entry);
        }

        let needle = query.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.title.to_lowercase().contains(&needle))
    }
}

#[async_trait]
impl TrackSource for CatalogTrackSource {
    async fn resolve(&self, request: &TrackRequest) -> std::result::Result<Track, SourceError> {
        let entry = self
            .find(&request.query)
            .ok_or_else(|| SourceError::NotFound(request.query.clone()))?;
        debug!(query = %request.query, id = %entry.id, "Resolved catalog track");

        Ok(Track {
            id: entry.id.clone(),
            title: entry.title.clone(),
            source_url: entry.source_url.clone(),
            duration_seconds: entry.duration_seconds,
            requested_by: request.requested_by.clone(),
        })
    }
}
