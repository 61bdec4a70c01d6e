use lambda_http::{Body, Response};

use crate::error::{ApiError, ApiResult};
use crate::router::AppState;

/// Handle GET /api/studios
/// Same unfiltered list on the public site and the panel; studios are
/// edited out of band, the API only reads them.
pub async fn handle_list(state: &AppState) -> ApiResult<Response<Body>> {
    let studios = state.collections.load_studios().await?;

    let body = serde_json::to_string(&studios)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(Body::Text(body))
        .unwrap())
}
