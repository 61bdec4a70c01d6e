use std::sync::Arc;

use http::header::HeaderValue;
use http::Method;
use lambda_http::{Body, Error, Request, Response};
use tracing::info;

use crate::assets::{self, AssetStore};
use crate::auth;
use crate::error::{ApiError, ApiResult};
use crate::games;
use crate::notifications;
use crate::session::{Session, SessionStore};
use crate::site_config;
use crate::store::Collections;
use crate::studios;
use crate::users;

pub struct AppState {
    pub collections: Collections,
    pub sessions: Arc<dyn SessionStore>,
    pub assets: Arc<dyn AssetStore>,
}

/// Single entry point for every request. Picks the public or panel flow
/// from the hostname, never from persisted state.
pub async fn handle_request(event: Request, state: &AppState) -> Result<Response<Body>, Error> {
    info!(
        "Handling request: {} {}",
        event.method(),
        event.uri().path()
    );

    if event.method() == Method::OPTIONS {
        return Ok(with_cors(preflight_response()));
    }

    let host = request_host(&event);
    let result = if is_panel_host(&host) {
        dispatch_panel(event, state).await
    } else {
        dispatch_public(event, state).await
    };

    let response = match result {
        Ok(resp) => resp,
        Err(err) => err.to_response(),
    };
    Ok(with_cors(response))
}

fn request_host(event: &Request) -> String {
    event
        .headers()
        .get("host")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| event.uri().host().map(str::to_string))
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// The panel lives on the `panel.` subdomain; every other hostname serves
/// the public site.
fn is_panel_host(host: &str) -> bool {
    let name = host.split(':').next().unwrap_or(host);
    name == "panel" || name.starts_with("panel.")
}

// ============================================================================
// Public flow: unauthenticated, read-only
// ============================================================================

async fn dispatch_public(event: Request, state: &AppState) -> ApiResult<Response<Body>> {
    let path = event.uri().path().to_string();
    let method = event.method().clone();

    match (method.as_str(), path.as_str()) {
        ("GET", "/api/games") => games::handle_list(state).await,
        ("GET", "/api/announcements") => notifications::handle_public_list(state).await,
        ("GET", "/api/studios") => studios::handle_list(state).await,
        ("GET", "/health") => health_response(),
        ("GET", p) => serve_public_asset(state, p).await,
        _ => Err(ApiError::NotFound),
    }
}

async fn serve_public_asset(state: &AppState, path: &str) -> ApiResult<Response<Body>> {
    let lookup = if path == "/" { "/index.html" } else { path };
    if let Some(asset) = state.assets.get(lookup).await? {
        return Ok(assets::asset_response(asset));
    }

    // SPA fallback: extensionless paths render the shell, missing files 404.
    if !lookup.rsplit('/').next().unwrap_or_default().contains('.') {
        if let Some(asset) = state.assets.get("/index.html").await? {
            return Ok(assets::asset_response(asset));
        }
    }
    Err(ApiError::NotFound)
}

// ============================================================================
// Panel flow
// ============================================================================

async fn dispatch_panel(event: Request, state: &AppState) -> ApiResult<Response<Body>> {
    let path = event.uri().path().to_string();
    let method = event.method().clone();

    match (method.as_str(), path.as_str()) {
        ("POST", "/api/login") => auth::handle_login(event, state).await,
        ("GET", "/api/logout") => auth::handle_logout(event, state).await,
        ("GET", "/health") => health_response(),
        _ => {
            // Everything else needs a session: API paths answer 401,
            // page loads render the login form instead.
            let Some(session) = auth::session_from_request(&event, state).await else {
                if path.starts_with("/api/") {
                    return Err(ApiError::Unauthorized);
                }
                return Ok(assets::login_page_response(200, None));
            };
            dispatch_panel_authed(event, state, &session, method.as_str(), &path).await
        }
    }
}

async fn dispatch_panel_authed(
    event: Request,
    state: &AppState,
    session: &Session,
    method: &str,
    path: &str,
) -> ApiResult<Response<Body>> {
    match (method, path) {
        ("GET", "/api/me") => auth::handle_me(session),

        ("GET", "/api/users") => users::handle_list(state, session).await,
        ("POST", "/api/users") => users::handle_create(event, state, session).await,
        ("GET", p) if p.starts_with("/api/users/") => {
            users::handle_get(state, session, p.trim_start_matches("/api/users/")).await
        }
        ("PUT", p) if p.starts_with("/api/users/") => {
            users::handle_update(event, state, session, p.trim_start_matches("/api/users/")).await
        }
        ("DELETE", p) if p.starts_with("/api/users/") => {
            users::handle_delete(state, session, p.trim_start_matches("/api/users/")).await
        }

        ("GET", "/api/games") => games::handle_list(state).await,
        ("POST", "/api/games") => games::handle_create(event, state, session).await,
        ("GET", p) if p.starts_with("/api/games/") => {
            games::handle_get(state, p.trim_start_matches("/api/games/")).await
        }
        ("PUT", p) if p.starts_with("/api/games/") => {
            games::handle_update(event, state, session, p.trim_start_matches("/api/games/")).await
        }
        ("DELETE", p) if p.starts_with("/api/games/") => {
            games::handle_delete(state, session, p.trim_start_matches("/api/games/")).await
        }

        ("GET", "/api/announcements") => notifications::handle_list(state).await,
        ("POST", "/api/announcements") => {
            notifications::handle_create(event, state, session).await
        }
        ("GET", p) if p.starts_with("/api/announcements/") => {
            notifications::handle_get(state, p.trim_start_matches("/api/announcements/")).await
        }
        ("PUT", p) if p.starts_with("/api/announcements/") => {
            notifications::handle_update(
                event,
                state,
                session,
                p.trim_start_matches("/api/announcements/"),
            )
            .await
        }
        ("DELETE", p) if p.starts_with("/api/announcements/") => {
            notifications::handle_delete(
                state,
                session,
                p.trim_start_matches("/api/announcements/"),
            )
            .await
        }

        ("GET", "/api/studios") => studios::handle_list(state).await,
        ("GET", "/api/config") => site_config::handle_get(state).await,
        ("PUT", "/api/config") => site_config::handle_update(event, state, session).await,
        ("GET", "/api/media") => site_config::handle_media(),

        (_, p) if p.starts_with("/api/") => Err(ApiError::NotFound),
        ("GET", p) => serve_panel_asset(state, p).await,
        _ => Err(ApiError::NotFound),
    }
}

/// Panel bundle lives under the `panel/` prefix in the asset bucket.
async fn serve_panel_asset(state: &AppState, path: &str) -> ApiResult<Response<Body>> {
    let lookup = if path == "/" {
        "/panel/index.html".to_string()
    } else {
        format!("/panel{}", path)
    };
    if let Some(asset) = state.assets.get(&lookup).await? {
        return Ok(assets::asset_response(asset));
    }

    if !path.rsplit('/').next().unwrap_or_default().contains('.') {
        if let Some(asset) = state.assets.get("/panel/index.html").await? {
            return Ok(assets::asset_response(asset));
        }
    }
    Err(ApiError::NotFound)
}

// ============================================================================
// Shared responses
// ============================================================================

fn health_response() -> ApiResult<Response<Body>> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(r#"{"status":"healthy"}"#.into())
        .unwrap())
}

fn preflight_response() -> Response<Body> {
    Response::builder().status(204).body(Body::Empty).unwrap()
}

/// The API is public-readable by design, so every response advertises the
/// permissive CORS surface, preflights included.
fn with_cors(mut response: Response<Body>) -> Response<Body> {
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    response
}
