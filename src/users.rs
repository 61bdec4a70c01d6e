use lambda_http::{Body, Request, Response};
use tracing::info;

use crate::auth::require_admin;
use crate::error::{ApiError, ApiResult};
use crate::models::{User, UserPatch};
use crate::router::AppState;
use crate::session::Session;
use crate::validation::{validate_password, validate_username};

fn json_response(status: u16, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::Text(body))
        .unwrap()
}

fn serialize<T: serde::Serialize>(value: &T) -> ApiResult<String> {
    serde_json::to_string(value)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))
}

/// Handle GET /api/users
pub async fn handle_list(state: &AppState, session: &Session) -> ApiResult<Response<Body>> {
    require_admin(session)?;

    let users: Vec<User> = state
        .collections
        .load_users()
        .await?
        .into_iter()
        .map(User::without_password)
        .collect();

    Ok(json_response(200, serialize(&users)?))
}

/// Handle GET /api/users/{username}
pub async fn handle_get(
    state: &AppState,
    session: &Session,
    username: &str,
) -> ApiResult<Response<Body>> {
    require_admin(session)?;

    let user = state
        .collections
        .load_users()
        .await?
        .into_iter()
        .find(|u| u.username == username)
        .ok_or(ApiError::NotFound)?;

    Ok(json_response(200, serialize(&user.without_password())?))
}

/// Handle POST /api/users
/// New accounts always carry the password inline on the user record.
pub async fn handle_create(
    event: Request,
    state: &AppState,
    session: &Session,
) -> ApiResult<Response<Body>> {
    require_admin(session)?;

    let user: User = serde_json::from_slice(event.body().as_ref())?;
    validate_username(&user.username)?;
    let password = user
        .password
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Password is required".to_string()))?;
    validate_password(password)?;

    let mut users = state.collections.load_users().await?;
    if users.iter().any(|u| u.username == user.username) {
        return Err(ApiError::BadRequest(format!(
            "User '{}' already exists",
            user.username
        )));
    }

    users.push(user.clone());
    state.collections.save_users(&users).await?;
    info!("Admin {} created user: {}", session.username, user.username);

    Ok(json_response(201, serialize(&user.without_password())?))
}

/// Handle PUT /api/users/{username}
/// The username is the record's identity and is never patchable.
pub async fn handle_update(
    event: Request,
    state: &AppState,
    session: &Session,
    username: &str,
) -> ApiResult<Response<Body>> {
    require_admin(session)?;

    let patch: UserPatch = serde_json::from_slice(event.body().as_ref())?;

    let mut users = state.collections.load_users().await?;
    let user = users
        .iter_mut()
        .find(|u| u.username == username)
        .ok_or(ApiError::NotFound)?;

    if let Some(password) = patch.password {
        validate_password(&password)?;
        user.password = Some(password);
    }
    if let Some(role) = patch.role {
        user.role = role;
    }
    if let Some(allowed_studios) = patch.allowed_studios {
        user.allowed_studios = allowed_studios;
    }
    let updated = user.clone();

    state.collections.save_users(&users).await?;
    info!("Admin {} updated user: {}", session.username, username);

    Ok(json_response(200, serialize(&updated.without_password())?))
}

/// Handle DELETE /api/users/{username}
/// Admins cannot remove their own account.
pub async fn handle_delete(
    state: &AppState,
    session: &Session,
    username: &str,
) -> ApiResult<Response<Body>> {
    require_admin(session)?;

    if username == session.username {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let mut users = state.collections.load_users().await?;
    let index = users
        .iter()
        .position(|u| u.username == username)
        .ok_or(ApiError::NotFound)?;

    let removed = users.remove(index);
    state.collections.save_users(&users).await?;
    info!("Admin {} deleted user: {}", session.username, username);

    Ok(json_response(200, serialize(&removed.without_password())?))
}
