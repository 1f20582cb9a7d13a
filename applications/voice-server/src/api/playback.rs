/// Playback control API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use voice_playback::{PlayOutcome, QueueListing, SkipOutcome, TenantId, Track, TrackRequest};

#[derive(Debug, Deserialize)]
pub struct PlayCommand {
    pub query: String,
    #[serde(default = "default_requester")]
    pub requested_by: String,
}

fn default_requester() -> String {
    "anonymous".to_string()
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayResponse {
    NowPlaying { track: Arc<Track> },
    Queued { track: Arc<Track>, position: usize },
}

impl From<PlayOutcome> for PlayResponse {
    fn from(outcome: PlayOutcome) -> Self {
        match outcome {
            PlayOutcome::NowPlaying(track) => PlayResponse::NowPlaying { track },
            PlayOutcome::Queued { track, position } => PlayResponse::Queued { track, position },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SkipResponse {
    Advanced { track: Arc<Track> },
    QueueEmpty,
}

impl From<SkipOutcome> for SkipResponse {
    fn from(outcome: SkipOutcome) -> Self {
        match outcome {
            SkipOutcome::Advanced(track) => SkipResponse::Advanced { track },
            SkipOutcome::QueueEmpty => SkipResponse::QueueEmpty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { status: "ok" })
    }
}

#[derive(Debug, Serialize)]
pub struct LoopResponse {
    pub loop_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct VolumeCommand {
    pub level: u16,
}

#[derive(Debug, Deserialize)]
pub struct QueueParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct NowPlayingResponse {
    pub track: Option<Arc<Track>>,
}

/// POST /tenants/:tenant/play - Start a track or queue it
pub async fn play(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
    Json(cmd): Json<PlayCommand>,
) -> Result<Json<PlayResponse>> {
    if cmd.query.trim().is_empty() {
        return Err(ServerError::BadRequest("query must not be empty".to_string()));
    }

    let request = TrackRequest::new(cmd.query, cmd.requested_by);
    let outcome = app_state
        .controller
        .play(TenantId::new(tenant), request)
        .await?;

    Ok(Json(outcome.into()))
}

/// POST /tenants/:tenant/skip - Move to the next queued track
pub async fn skip(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Result<Json<SkipResponse>> {
    let outcome = app_state.controller.skip(TenantId::new(tenant)).await?;
    Ok(Json(outcome.into()))
}

/// POST /tenants/:tenant/stop - Stop playback and clear the queue
pub async fn stop(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Result<Json<StatusResponse>> {
    app_state.controller.stop(TenantId::new(tenant)).await?;
    Ok(Json(StatusResponse { status: "stopped" }))
}

/// POST /tenants/:tenant/pause
pub async fn pause(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Result<Json<StatusResponse>> {
    app_state.controller.pause(TenantId::new(tenant)).await?;
    Ok(StatusResponse::ok())
}

/// POST /tenants/:tenant/resume
pub async fn resume(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Result<Json<StatusResponse>> {
    app_state.controller.resume(TenantId::new(tenant)).await?;
    Ok(StatusResponse::ok())
}

/// POST /tenants/:tenant/loop - Toggle loop mode
pub async fn toggle_loop(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Result<Json<LoopResponse>> {
    let loop_enabled = app_state
        .controller
        .toggle_loop(TenantId::new(tenant))
        .await?;
    Ok(Json(LoopResponse { loop_enabled }))
}

/// PUT /tenants/:tenant/volume
pub async fn set_volume(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
    Json(cmd): Json<VolumeCommand>,
) -> Result<Json<StatusResponse>> {
    app_state
        .controller
        .set_volume(TenantId::new(tenant), cmd.level)
        .await?;
    Ok(StatusResponse::ok())
}

/// GET /tenants/:tenant/queue?limit=N
pub async fn list_queue(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
    Query(params): Query<QueueParams>,
) -> Result<Json<QueueListing>> {
    let listing = app_state
        .controller
        .list_queue(TenantId::new(tenant), params.limit)
        .await?;
    Ok(Json(listing))
}

/// DELETE /tenants/:tenant/queue - Drop pending tracks, keep the current one
pub async fn clear_queue(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Result<Json<ClearResponse>> {
    let removed = app_state
        .controller
        .clear_queue(TenantId::new(tenant))
        .await?;
    Ok(Json(ClearResponse { removed }))
}

/// GET /tenants/:tenant/now
pub async fn now_playing(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Result<Json<NowPlayingResponse>> {
    let track = app_state
        .controller
        .now_playing(TenantId::new(tenant))
        .await?;
    Ok(Json(NowPlayingResponse { track }))
}
