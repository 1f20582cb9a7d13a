/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use voice_playback::PlaybackError;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// HTTP status and stable error code for the response body
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Playback(err) => match err {
                PlaybackError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                PlaybackError::NothingPlaying => (StatusCode::CONFLICT, "nothing_playing"),
                PlaybackError::QueueFull { .. } => (StatusCode::CONFLICT, "queue_full"),
                PlaybackError::NoActiveVoiceSession(_) => {
                    (StatusCode::CONFLICT, "no_active_voice_session")
                }
                PlaybackError::InvalidVolume(_) => (StatusCode::BAD_REQUEST, "invalid_volume"),
                PlaybackError::TenantLimitReached(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "tenant_limit_reached")
                }
                PlaybackError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                PlaybackError::Transient(_) => (StatusCode::BAD_GATEWAY, "transient"),
                PlaybackError::WorkerUnavailable(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "worker_unavailable")
                }
            },
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
            ServerError::Catalog(_) => (StatusCode::INTERNAL_SERVER_ERROR, "catalog"),
            ServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(kind, "Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}
