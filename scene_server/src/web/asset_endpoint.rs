use std::{path::Path, sync::Arc};

use axum::{
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use super::sync::SyncState;

/// `/data/:hash` serves asset blobs, `/scene_id` the id of the current scene.
/// Everything else comes from `static_dir` when one is configured.
pub fn asset_router(state: Arc<SyncState>, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/data/:hash", get(get_asset))
        .route("/scene_id", get(get_scene_id))
        .with_state(state);
    match static_dir {
        Some(dir) => {
            router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        None => router,
    }
}

pub async fn get_asset(
    State(state): State<Arc<SyncState>>,
    UrlPath(hash): UrlPath<String>,
) -> Response {
    match state.asset(&hash) {
        Some(data) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            data,
        )
            .into_response(),
        None => {
            log::debug!("Asset {hash} not found");
            (StatusCode::NOT_FOUND, "Invalid asset data request").into_response()
        }
    }
}

pub async fn get_scene_id(State(state): State<Arc<SyncState>>) -> Response {
    match state.scene_id() {
        Some(id) => id.to_string().into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "No scene loaded").into_response(),
    }
}
