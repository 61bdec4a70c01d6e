use chrono::Utc;
use lambda_http::{Body, Request, Response};
use tracing::{info, warn};

use crate::auth::can_act_opt;
use crate::error::{ApiError, ApiResult};
use crate::models::{mint_id, Game, Notification, NotificationPatch};
use crate::router::AppState;
use crate::session::Session;
use crate::validation::validate_name;

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

/// Owning studio of the game a notification points at, when the game still
/// exists.
fn game_owner<'a>(games: &'a [Game], game_id: &str) -> Option<&'a str> {
    games
        .iter()
        .find(|g| g.id == game_id)
        .map(|g| g.owned_by.as_str())
}

fn require_game_permission(
    session: &Session,
    games: &[Game],
    game_id: &str,
) -> ApiResult<()> {
    let owner = game_owner(games, game_id);
    if owner.is_none() {
        warn!("Notification references unknown game: {}", game_id);
    }
    if !can_act_opt(session, owner) {
        return Err(ApiError::Forbidden(format!(
            "No permission for the studio owning game '{}'",
            game_id
        )));
    }
    Ok(())
}

/// Handle GET /api/announcements (public site)
/// Only active records whose countdown is absent or still in the future.
pub async fn handle_public_list(state: &AppState) -> ApiResult<Response<Body>> {
    let now = Utc::now();
    let notifications: Vec<Notification> = state
        .collections
        .load_notifications()
        .await?
        .into_iter()
        .filter(|n| n.is_publicly_visible(now))
        .collect();

    Ok(json_response(200, serialize(&notifications)?))
}

/// Handle GET /api/announcements (panel)
pub async fn handle_list(state: &AppState) -> ApiResult<Response<Body>> {
    let notifications = state.collections.load_notifications().await?;
    Ok(json_response(200, serialize(&notifications)?))
}

/// Handle GET /api/announcements/{id}
pub async fn handle_get(state: &AppState, notification_id: &str) -> ApiResult<Response<Body>> {
    let notifications = state.collections.load_notifications().await?;
    let notification = notifications
        .iter()
        .find(|n| n.id == notification_id)
        .ok_or(ApiError::NotFound)?;

    Ok(json_response(200, serialize(notification)?))
}

/// Handle POST /api/announcements
/// The caller needs permission on the studio owning the referenced game.
pub async fn handle_create(
    event: Request,
    state: &AppState,
    session: &Session,
) -> ApiResult<Response<Body>> {
    let mut notification: Notification = serde_json::from_slice(event.body().as_ref())?;
    validate_name(&notification.title)?;

    let games = state.collections.load_games().await?;
    if game_owner(&games, &notification.game_id).is_none() {
        return Err(ApiError::BadRequest(format!(
            "Unknown game '{}'",
            notification.game_id
        )));
    }
    require_game_permission(session, &games, &notification.game_id)?;

    if notification.id.is_empty() {
        notification.id = mint_id("notification");
    }

    let mut notifications = state.collections.load_notifications().await?;
    if notifications.iter().any(|n| n.id == notification.id) {
        return Err(ApiError::BadRequest(format!(
            "Notification with id '{}' already exists",
            notification.id
        )));
    }

    notifications.push(notification.clone());
    state.collections.save_notifications(&notifications).await?;
    info!(
        "User {} created notification: {}",
        session.username, notification.id
    );

    Ok(json_response(201, serialize(&notification)?))
}

/// Handle PUT /api/announcements/{id}
/// Re-pointing `gameId` at a game owned by a different studio needs
/// permission on both studios, checked before anything is written.
pub async fn handle_update(
    event: Request,
    state: &AppState,
    session: &Session,
    notification_id: &str,
) -> ApiResult<Response<Body>> {
    let patch: NotificationPatch = serde_json::from_slice(event.body().as_ref())?;

    let mut notifications = state.collections.load_notifications().await?;
    let index = notifications
        .iter()
        .position(|n| n.id == notification_id)
        .ok_or(ApiError::NotFound)?;

    let games = state.collections.load_games().await?;
    require_game_permission(session, &games, &notifications[index].game_id)?;

    if let Some(new_game_id) = &patch.game_id {
        if new_game_id != &notifications[index].game_id {
            if game_owner(&games, new_game_id).is_none() {
                return Err(ApiError::BadRequest(format!(
                    "Unknown game '{}'",
                    new_game_id
                )));
            }
            require_game_permission(session, &games, new_game_id)?;
        }
    }

    if let Some(title) = &patch.title {
        validate_name(title)?;
    }

    let notification = &mut notifications[index];
    if let Some(game_id) = patch.game_id {
        notification.game_id = game_id;
    }
    if let Some(title) = patch.title {
        notification.title = title;
    }
    if let Some(description) = patch.description {
        notification.description = description;
    }
    if let Some(countdown_to) = patch.countdown_to {
        notification.countdown_to = Some(countdown_to);
    }
    if let Some(youtube_video_id) = patch.youtube_video_id {
        notification.youtube_video_id = Some(youtube_video_id);
    }
    if let Some(link) = patch.link {
        notification.link = Some(link);
    }
    if let Some(active) = patch.active {
        notification.active = active;
    }
    let updated = notification.clone();

    state.collections.save_notifications(&notifications).await?;
    info!(
        "User {} updated notification: {}",
        session.username, notification_id
    );

    Ok(json_response(200, serialize(&updated)?))
}

/// Handle DELETE /api/announcements/{id}
pub async fn handle_delete(
    state: &AppState,
    session: &Session,
    notification_id: &str,
) -> ApiResult<Response<Body>> {
    let mut notifications = state.collections.load_notifications().await?;
    let index = notifications
        .iter()
        .position(|n| n.id == notification_id)
        .ok_or(ApiError::NotFound)?;

    let games = state.collections.load_games().await?;
    require_game_permission(session, &games, &notifications[index].game_id)?;

    let removed = notifications.remove(index);
    state.collections.save_notifications(&notifications).await?;
    info!(
        "User {} deleted notification: {}",
        session.username, notification_id
    );

    Ok(json_response(200, serialize(&removed)?))
}
