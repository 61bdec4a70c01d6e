use lambda_http::{Body, Request, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assets;
use crate::error::{ApiError, ApiResult};
use crate::models::{Role, User};
use crate::router::AppState;
use crate::session::{clear_session_cookie, session_cookie, token_from_cookie_header, Session};
use crate::store::Collections;

/// Studio-scoped permission check. Admins and wildcard grants pass
/// unconditionally; everyone else needs an exact match on the owning
/// studio's name.
pub fn can_act(session: &Session, owner_studio: &str) -> bool {
    session.role == Role::Admin
        || session.allowed_studios.iter().any(|s| s == "*")
        || session.allowed_studios.iter().any(|s| s == owner_studio)
}

/// Variant for resources whose owning studio cannot be resolved (a game id
/// that no longer exists). Scoped users are denied; admins and wildcard
/// grants still pass.
pub fn can_act_opt(session: &Session, owner_studio: Option<&str>) -> bool {
    match owner_studio {
        Some(owner) => can_act(session, owner),
        None => session.role == Role::Admin || session.allowed_studios.iter().any(|s| s == "*"),
    }
}

pub async fn session_from_request(event: &Request, state: &AppState) -> Option<Session> {
    let header = event.headers().get("cookie")?.to_str().ok()?;
    let token = token_from_cookie_header(header)?;
    state.sessions.validate(token).await
}

pub fn require_admin(session: &Session) -> ApiResult<()> {
    if session.role != Role::Admin {
        warn!(
            "User {} attempted admin access with role: {:?}",
            session.username, session.role
        );
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

pub fn require_studio(session: &Session, owner_studio: &str) -> ApiResult<()> {
    if !can_act(session, owner_studio) {
        warn!(
            "User {} denied access to studio '{}'",
            session.username, owner_studio
        );
        return Err(ApiError::Forbidden(format!(
            "No permission for studio '{}'",
            owner_studio
        )));
    }
    Ok(())
}

// ============================================================================
// Credential checks
// ============================================================================

/// Accounts created before passwords moved inline keep their secret in a
/// standalone `user:<name>` document.
#[derive(Deserialize)]
struct LegacyCredential {
    password: String,
}

/// Password checks in priority order, first decision wins: the inline
/// `password` field on the user record, then the legacy `user:<name>`
/// document. New accounts always carry the password inline.
pub async fn verify_credentials(
    collections: &Collections,
    username: &str,
    password: &str,
) -> ApiResult<Option<User>> {
    let users = collections.load_users().await?;
    let Some(user) = users.into_iter().find(|u| u.username == username) else {
        return Ok(None);
    };

    let verdict = match check_inline(&user, password) {
        Some(ok) => ok,
        None => check_legacy(collections, username, password)
            .await?
            .unwrap_or(false),
    };

    Ok(verdict.then_some(user))
}

fn check_inline(user: &User, password: &str) -> Option<bool> {
    user.password.as_deref().map(|stored| stored == password)
}

async fn check_legacy(
    collections: &Collections,
    username: &str,
    password: &str,
) -> ApiResult<Option<bool>> {
    let key = format!("user:{}", username);
    let Some(raw) = collections.get_raw(&key).await? else {
        return Ok(None);
    };
    let legacy: LegacyCredential = serde_json::from_str(&raw).map_err(|e| {
        warn!("Corrupt legacy credential document '{}': {}", key, e);
        ApiError::StoreError(format!("Corrupt document under '{}'", key))
    })?;
    Ok(Some(legacy.password == password))
}

// ============================================================================
// Login / logout / me
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    username: String,
    role: Role,
    allowed_studios: Vec<String>,
}

/// Handle POST /api/login
/// Browser-facing: failure re-renders the login page, never JSON.
pub async fn handle_login(event: Request, state: &AppState) -> ApiResult<Response<Body>> {
    let mut username = None;
    let mut password = None;
    for (key, value) in url::form_urlencoded::parse(event.body().as_ref()) {
        match key.as_ref() {
            "username" => username = Some(value.into_owned()),
            "password" => password = Some(value.into_owned()),
            _ => {}
        }
    }

    let (username, password) = match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => return Ok(assets::login_page_response(401, Some("Invalid credentials"))),
    };

    match verify_credentials(&state.collections, &username, &password).await? {
        Some(user) => {
            let session = state
                .sessions
                .create(&user.username, user.role, user.allowed_studios.clone())
                .await;
            info!("Login succeeded for user: {}", user.username);

            Ok(Response::builder()
                .status(302)
                .header("Location", "/")
                .header("Set-Cookie", session_cookie(&session.token))
                .body(Body::Empty)
                .unwrap())
        }
        None => {
            warn!("Login failed for user: {}", username);
            Ok(assets::login_page_response(401, Some("Invalid credentials")))
        }
    }
}

/// Handle GET /api/logout
/// Destroying an unknown or absent token is a no-op.
pub async fn handle_logout(event: Request, state: &AppState) -> ApiResult<Response<Body>> {
    if let Some(token) = event
        .headers()
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(token_from_cookie_header)
    {
        state.sessions.destroy(token).await;
    }

    Ok(Response::builder()
        .status(302)
        .header("Location", "/")
        .header("Set-Cookie", clear_session_cookie())
        .body(Body::Empty)
        .unwrap())
}

/// Handle GET /api/me
pub fn handle_me(session: &Session) -> ApiResult<Response<Body>> {
    let response = MeResponse {
        username: session.username.clone(),
        role: session.role,
        allowed_studios: session.allowed_studios.clone(),
    };

    let body = serde_json::to_string(&response)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(Body::Text(body))
        .unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(role: Role, allowed: &[&str]) -> Session {
        Session {
            token: "t".to_string(),
            username: "u".to_string(),
            role,
            allowed_studios: allowed.iter().map(|s| s.to_string()).collect(),
            expires: i64::MAX,
        }
    }

    #[test]
    fn permission_truth_table() {
        let owners = ["Studio A", "Studio B", "Missing Studio"];
        let allowed_sets: &[&[&str]] = &[
            &[],
            &["*"],
            &["Studio A"],
            &["Studio A", "Studio B"],
            &["Studio B"],
        ];

        for role in [Role::Admin, Role::User] {
            for allowed in allowed_sets {
                for owner in owners {
                    let session = session_with(role, allowed);
                    let expected = role == Role::Admin
                        || allowed.contains(&"*")
                        || allowed.contains(&owner);
                    assert_eq!(
                        can_act(&session, owner),
                        expected,
                        "role {:?}, allowed {:?}, owner {}",
                        role,
                        allowed,
                        owner
                    );
                }
            }
        }
    }

    #[test]
    fn wildcard_is_literal_not_prefix() {
        let session = session_with(Role::User, &["Studio*"]);
        assert!(!can_act(&session, "Studio A"));
        assert!(can_act(&session, "Studio*"));
    }

    #[test]
    fn unresolvable_owner_denies_scoped_users() {
        assert!(can_act_opt(&session_with(Role::Admin, &[]), None));
        assert!(can_act_opt(&session_with(Role::User, &["*"]), None));
        assert!(!can_act_opt(&session_with(Role::User, &["Studio A"]), None));
    }

    #[test]
    fn admin_guard() {
        assert!(require_admin(&session_with(Role::Admin, &[])).is_ok());
        let err = require_admin(&session_with(Role::User, &["*"])).unwrap_err();
        assert_eq!(err.status(), 403);
    }
}
