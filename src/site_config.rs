use lambda_http::{Body, Request, Response};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::SiteConfig;
use crate::router::AppState;
use crate::session::Session;

/// Media asset paths the panel's pickers can offer. The bundle is baked at
/// deploy time, so the list is static.
pub const MEDIA_PATHS: &[&str] = &[
    "/media/games/starfall-outpost-logo.png",
    "/media/games/starfall-outpost-1.jpg",
    "/media/games/starfall-outpost-2.jpg",
    "/media/games/hollow-harbor-logo.png",
    "/media/games/hollow-harbor-1.jpg",
    "/media/studios/northgate-logo.png",
    "/media/studios/northgate-thumb.jpg",
    "/media/studios/northgate-banner.jpg",
    "/media/studios/driftline-logo.png",
    "/media/hero/countdown-backdrop.jpg",
];

fn json_response(status: u16, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::Text(body))
        .unwrap()
}

/// Handle GET /api/config
/// An absent document reads as the empty config.
pub async fn handle_get(state: &AppState) -> ApiResult<Response<Body>> {
    let config = state.collections.load_config().await?;
    let body = serde_json::to_string(&config)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Ok(json_response(200, body))
}

/// Handle PUT /api/config
pub async fn handle_update(
    event: Request,
    state: &AppState,
    session: &Session,
) -> ApiResult<Response<Body>> {
    let config: SiteConfig = serde_json::from_slice(event.body().as_ref())?;
    state.collections.save_config(&config).await?;
    info!("User {} updated site config", session.username);

    let body = serde_json::to_string(&config)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Ok(json_response(200, body))
}

/// Handle GET /api/media
pub fn handle_media() -> ApiResult<Response<Body>> {
    let body = serde_json::to_string(&MEDIA_PATHS)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Ok(json_response(200, body))
}
