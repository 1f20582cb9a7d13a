/// Simulated voice session routes
use crate::{api::playback::StatusResponse, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use voice_playback::TenantId;

/// POST /tenants/:tenant/session - Join the tenant's voice chat
pub async fn open_session(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Json<StatusResponse> {
    app_state.engine.open_session(TenantId::new(tenant));
    StatusResponse::ok()
}

/// DELETE /tenants/:tenant/session - Leave the tenant's voice chat
pub async fn close_session(
    State(app_state): State<AppState>,
    Path(tenant): Path<i64>,
) -> Json<StatusResponse> {
    app_state.engine.close_session(TenantId::new(tenant));
    StatusResponse::ok()
}
