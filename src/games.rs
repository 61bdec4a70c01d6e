use lambda_http::{Body, Request, Response};
use tracing::info;

use crate::auth::require_studio;
use crate::error::{ApiError, ApiResult};
use crate::models::{migrate_genres, mint_id, Game, GamePatch};
use crate::router::AppState;
use crate::session::Session;
use crate::validation::{validate_description, validate_name, validate_owner};

fn json_response(status: u16, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::Text(body))
        .unwrap()
}

/// Handle GET /api/games
/// Served on both the public site and the panel; migration is applied by
/// the collection load.
pub async fn handle_list(state: &AppState) -> ApiResult<Response<Body>> {
    let games = state.collections.load_games().await?;
    let body = serde_json::to_string(&games)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Ok(json_response(200, body))
}

/// Handle GET /api/games/{id}
pub async fn handle_get(state: &AppState, game_id: &str) -> ApiResult<Response<Body>> {
    let games = state.collections.load_games().await?;
    let game = games
        .iter()
        .find(|g| g.id == game_id)
        .ok_or(ApiError::NotFound)?;

    let body = serde_json::to_string(game)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Ok(json_response(200, body))
}

/// Handle POST /api/games
/// Mints an id when the body carries none. The caller needs permission on
/// the studio the game will belong to.
pub async fn handle_create(
    event: Request,
    state: &AppState,
    session: &Session,
) -> ApiResult<Response<Body>> {
    let mut game: Game = serde_json::from_slice(event.body().as_ref())?;

    validate_name(&game.name)?;
    validate_description(&game.description)?;
    validate_owner(&game.owned_by)?;
    require_studio(session, &game.owned_by)?;

    if game.id.is_empty() {
        game.id = mint_id("game");
    }
    migrate_genres(&mut game);

    let mut games = state.collections.load_games().await?;
    if games.iter().any(|g| g.id == game.id) {
        return Err(ApiError::BadRequest(format!(
            "Game with id '{}' already exists",
            game.id
        )));
    }

    games.push(game.clone());
    state.collections.save_games(&games).await?;
    info!("User {} created game: {}", session.username, game.id);

    let body = serde_json::to_string(&game)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Ok(json_response(201, body))
}

/// Handle PUT /api/games/{id}
/// Partial merge; reassigning `ownedBy` needs permission on both the
/// current and the proposed studio, checked before anything is written.
pub async fn handle_update(
    event: Request,
    state: &AppState,
    session: &Session,
    game_id: &str,
) -> ApiResult<Response<Body>> {
    let patch: GamePatch = serde_json::from_slice(event.body().as_ref())?;

    let mut games = state.collections.load_games().await?;
    let index = games
        .iter()
        .position(|g| g.id == game_id)
        .ok_or(ApiError::NotFound)?;

    require_studio(session, &games[index].owned_by)?;
    if let Some(new_owner) = &patch.owned_by {
        if new_owner != &games[index].owned_by {
            validate_owner(new_owner)?;
            require_studio(session, new_owner)?;
        }
    }

    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }

    let game = &mut games[index];
    apply_patch(game, patch);
    migrate_genres(game);
    let updated = game.clone();

    state.collections.save_games(&games).await?;
    info!("User {} updated game: {}", session.username, game_id);

    let body = serde_json::to_string(&updated)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Ok(json_response(200, body))
}

/// Handle DELETE /api/games/{id}
pub async fn handle_delete(
    state: &AppState,
    session: &Session,
    game_id: &str,
) -> ApiResult<Response<Body>> {
    let mut games = state.collections.load_games().await?;
    let index = games
        .iter()
        .position(|g| g.id == game_id)
        .ok_or(ApiError::NotFound)?;

    require_studio(session, &games[index].owned_by)?;

    let removed = games.remove(index);
    state.collections.save_games(&games).await?;
    info!("User {} deleted game: {}", session.username, game_id);

    let body = serde_json::to_string(&removed)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Ok(json_response(200, body))
}

fn apply_patch(game: &mut Game, patch: GamePatch) {
    if let Some(name) = patch.name {
        game.name = name;
    }
    if let Some(logo) = patch.logo {
        game.logo = logo;
    }
    if let Some(description) = patch.description {
        game.description = description;
    }
    if let Some(owned_by) = patch.owned_by {
        game.owned_by = owned_by;
    }
    if let Some(status) = patch.status {
        game.status = status;
    }
    if let Some(genres) = patch.genres {
        game.genres = genres;
    }
    if let Some(genre) = patch.genre {
        game.genre = Some(genre);
    }
    if let Some(youtube_video_id) = patch.youtube_video_id {
        game.youtube_video_id = Some(youtube_video_id);
    }
    if let Some(thumbnails) = patch.thumbnails {
        game.thumbnails = Some(thumbnails);
    }
    if let Some(spotify_albums) = patch.spotify_albums {
        game.spotify_albums = Some(spotify_albums);
    }
    if let Some(link) = patch.link {
        game.link = Some(link);
    }
    if let Some(order) = patch.order {
        game.order = Some(order);
    }
    if let Some(visible) = patch.visible {
        game.visible = Some(visible);
    }
    if let Some(events) = patch.events {
        game.events = Some(events);
    }
}
