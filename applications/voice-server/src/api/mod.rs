/// API route modules
pub mod playback;
pub mod sessions;

use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

/// Tenant control routes, without middleware layers
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/tenants/:tenant/play", post(playback::play))
        .route("/tenants/:tenant/skip", post(playback::skip))
        .route("/tenants/:tenant/stop", post(playback::stop))
        .route("/tenants/:tenant/pause", post(playback::pause))
        .route("/tenants/:tenant/resume", post(playback::resume))
        .route("/tenants/:tenant/loop", post(playback::toggle_loop))
        .route("/tenants/:tenant/volume", put(playback::set_volume))
        .route(
            "/tenants/:tenant/queue",
            get(playback::list_queue).delete(playback::clear_queue),
        )
        .route("/tenants/:tenant/now", get(playback::now_playing))
        .route(
            "/tenants/:tenant/session",
            post(sessions::open_session).delete(sessions::close_session),
        )
        .with_state(app_state)
}
