use std::sync::Arc;

use http::Request as HttpRequest;
use lambda_http::{Body, Response};

use northgate_site_api::assets::MemoryAssets;
use northgate_site_api::session::MemorySessions;
use northgate_site_api::store::{Collections, KvBackend, MemoryKv};
use northgate_site_api::{handle_request, AppState};

const PANEL_HOST: &str = "panel.northgate.example";

fn test_state() -> (Arc<MemoryKv>, AppState) {
    let kv = Arc::new(MemoryKv::default());
    let state = AppState {
        collections: Collections::new(kv.clone()),
        sessions: Arc::new(MemorySessions::default()),
        assets: Arc::new(MemoryAssets::default()),
    };
    (kv, state)
}

fn panel_request(method: &str, path: &str, cookie: Option<&str>, body: Body) -> lambda_http::Request {
    let mut builder = HttpRequest::builder()
        .method(method)
        .uri(format!("https://{}{}", PANEL_HOST, path))
        .header("host", PANEL_HOST);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(body).unwrap()
}

fn body_string(response: &Response<Body>) -> String {
    match response.body() {
        Body::Text(text) => text.clone(),
        Body::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Body::Empty => String::new(),
    }
}

fn body_json(response: &Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response)).expect("response body should be JSON")
}

async fn login(state: &AppState, username: &str, password: &str) -> String {
    let form = format!("username={}&password={}", username, password);
    let request = HttpRequest::builder()
        .method("POST")
        .uri(format!("https://{}/api/login", PANEL_HOST))
        .header("host", PANEL_HOST)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::Text(form))
        .unwrap();

    let response = handle_request(request, state).await.unwrap();
    assert_eq!(response.status(), 302, "login should redirect");
    let cookie = response
        .headers()
        .get("set-cookie")
        .expect("login should set a cookie")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

async fn seed_scoped_world(kv: &MemoryKv) {
    kv.put(
        "users",
        r#"[
            {"username":"admin","password":"northgate-dev","role":"admin","allowedStudios":["*"]},
            {"username":"scoped","password":"scoped-pw","role":"user","allowedStudios":["Studio A"]}
        ]"#,
    )
    .await
    .unwrap();
    kv.put(
        "games",
        r#"[
            {"id":"game-a","name":"Alpha","ownedBy":"Studio A","status":"playable","genres":[]},
            {"id":"game-b","name":"Bravo","ownedBy":"Studio B","status":"beta","genres":[]}
        ]"#,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn login_then_me_returns_profile() {
    let (_kv, state) = test_state();

    let cookie = login(&state, "admin", "northgate-dev").await;
    assert!(cookie.starts_with("panel_session="));
    let token = cookie.trim_start_matches("panel_session=");
    assert_eq!(token.len(), 64);

    let response = handle_request(
        panel_request("GET", "/api/me", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(response.status(), 200);

    let me = body_json(&response);
    assert_eq!(me["username"], "admin");
    assert_eq!(me["role"], "admin");
    assert_eq!(me["allowedStudios"], serde_json::json!(["*"]));
}

#[tokio::test]
async fn login_failure_rerenders_page_without_cookie() {
    let (_kv, state) = test_state();

    let form = "username=admin&password=wrong".to_string();
    let request = panel_request(
        "POST",
        "/api/login",
        None,
        Body::Text(form),
    );
    let response = handle_request(request, &state).await.unwrap();

    assert_eq!(response.status(), 401);
    assert!(response.headers().get("set-cookie").is_none());
    let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    assert!(body_string(&response).contains("Invalid credentials"));
}

#[tokio::test]
async fn legacy_credential_document_still_logs_in() {
    let (kv, state) = test_state();
    kv.put(
        "users",
        r#"[{"username":"old-timer","role":"user","allowedStudios":["Studio A"]}]"#,
    )
    .await
    .unwrap();
    kv.put("user:old-timer", r#"{"password":"old-secret"}"#)
        .await
        .unwrap();

    let cookie = login(&state, "old-timer", "old-secret").await;

    let response = handle_request(
        panel_request("GET", "/api/me", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(body_json(&response)["username"], "old-timer");
}

#[tokio::test]
async fn unauthenticated_api_gets_401_and_pages_get_login_form() {
    let (_kv, state) = test_state();

    let api = handle_request(panel_request("GET", "/api/games", None, Body::Empty), &state)
        .await
        .unwrap();
    assert_eq!(api.status(), 401);
    assert_eq!(body_json(&api)["error"], "Authentication required");

    let page = handle_request(panel_request("GET", "/", None, Body::Empty), &state)
        .await
        .unwrap();
    assert_eq!(page.status(), 200);
    assert!(body_string(&page).contains("<form"));

    let stale = handle_request(
        panel_request(
            "GET",
            "/api/me",
            Some("panel_session=0000000000000000000000000000000000000000000000000000000000000000"),
            Body::Empty,
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(stale.status(), 401);
}

#[tokio::test]
async fn scoped_user_cannot_edit_other_studios_game() {
    let (kv, state) = test_state();
    seed_scoped_world(&kv).await;

    let cookie = login(&state, "scoped", "scoped-pw").await;
    let response = handle_request(
        panel_request(
            "PUT",
            "/api/games/game-b",
            Some(&cookie),
            Body::Text(r#"{"name":"Hijacked"}"#.to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(response.status(), 403);

    // The stored record is untouched.
    let stored = kv.get("games").await.unwrap().unwrap();
    assert!(stored.contains("\"Bravo\""));
    assert!(!stored.contains("Hijacked"));
}

#[tokio::test]
async fn scoped_user_can_edit_own_game_but_not_reassign_it() {
    let (kv, state) = test_state();
    seed_scoped_world(&kv).await;

    let cookie = login(&state, "scoped", "scoped-pw").await;

    let rename = handle_request(
        panel_request(
            "PUT",
            "/api/games/game-a",
            Some(&cookie),
            Body::Text(r#"{"name":"Alpha Remastered"}"#.to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(rename.status(), 200);
    assert_eq!(body_json(&rename)["name"], "Alpha Remastered");

    // Moving the game to a studio outside the grant fails both-ways check.
    let reassign = handle_request(
        panel_request(
            "PUT",
            "/api/games/game-a",
            Some(&cookie),
            Body::Text(r#"{"ownedBy":"Studio B"}"#.to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(reassign.status(), 403);

    let stored = kv.get("games").await.unwrap().unwrap();
    assert!(stored.contains("\"ownedBy\":\"Studio A\""));
}

#[tokio::test]
async fn create_game_mints_id_and_shows_up_in_list() {
    let (_kv, state) = test_state();
    let cookie = login(&state, "admin", "northgate-dev").await;

    let created = handle_request(
        panel_request(
            "POST",
            "/api/games",
            Some(&cookie),
            Body::Text(
                r#"{"name":"New Game","ownedBy":"Northgate Interactive","status":"in-development"}"#
                    .to_string(),
            ),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(created.status(), 201);

    let id = body_json(&created)["id"].as_str().unwrap().to_string();
    let digits = id.strip_prefix("game-").expect("minted id prefix");
    assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));

    let list = handle_request(
        panel_request("GET", "/api/games", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    let games = body_json(&list);
    let matching: Vec<_> = games
        .as_array()
        .unwrap()
        .iter()
        .filter(|g| g["id"] == id.as_str())
        .collect();
    assert_eq!(matching.len(), 1);
}

#[tokio::test]
async fn missing_game_is_404_not_403() {
    let (kv, state) = test_state();
    seed_scoped_world(&kv).await;

    let scoped = login(&state, "scoped", "scoped-pw").await;

    let missing = handle_request(
        panel_request(
            "PUT",
            "/api/games/game-nope",
            Some(&scoped),
            Body::Text(r#"{"name":"X"}"#.to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(missing.status(), 404);

    let forbidden = handle_request(
        panel_request(
            "PUT",
            "/api/games/game-b",
            Some(&scoped),
            Body::Text(r#"{"name":"X"}"#.to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(forbidden.status(), 403);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let (_kv, state) = test_state();
    let cookie = login(&state, "admin", "northgate-dev").await;

    let response = handle_request(
        panel_request(
            "POST",
            "/api/games",
            Some(&cookie),
            Body::Text("{not json".to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn users_require_admin_and_strip_passwords() {
    let (kv, state) = test_state();
    seed_scoped_world(&kv).await;

    let admin = login(&state, "admin", "northgate-dev").await;
    let scoped = login(&state, "scoped", "scoped-pw").await;

    // Non-admin sessions are locked out of user management entirely.
    let denied = handle_request(
        panel_request("GET", "/api/users", Some(&scoped), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(denied.status(), 403);

    let listed = handle_request(
        panel_request("GET", "/api/users", Some(&admin), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(listed.status(), 200);
    assert!(!body_string(&listed).contains("password"));
    assert!(!body_string(&listed).contains("northgate-dev"));

    let created = handle_request(
        panel_request(
            "POST",
            "/api/users",
            Some(&admin),
            Body::Text(
                r#"{"username":"editor","password":"editor-pw","role":"user","allowedStudios":["Studio B"]}"#
                    .to_string(),
            ),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(created.status(), 201);
    assert!(!body_string(&created).contains("editor-pw"));

    let duplicate = handle_request(
        panel_request(
            "POST",
            "/api/users",
            Some(&admin),
            Body::Text(
                r#"{"username":"editor","password":"x","role":"user","allowedStudios":[]}"#
                    .to_string(),
            ),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(duplicate.status(), 400);

    let missing = handle_request(
        panel_request("GET", "/api/users/nobody", Some(&admin), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let (kv, state) = test_state();
    let cookie = login(&state, "admin", "northgate-dev").await;

    let before = kv.get("users").await.unwrap().unwrap();
    let response = handle_request(
        panel_request("DELETE", "/api/users/admin", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(kv.get("users").await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn logout_clears_cookie_and_invalidates_session() {
    let (_kv, state) = test_state();
    let cookie = login(&state, "admin", "northgate-dev").await;

    let logout = handle_request(
        panel_request("GET", "/api/logout", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(logout.status(), 302);
    let cleared = logout
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let me = handle_request(
        panel_request("GET", "/api/me", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(me.status(), 401);
}

#[tokio::test]
async fn config_roundtrip_and_media_list() {
    let (_kv, state) = test_state();
    let cookie = login(&state, "admin", "northgate-dev").await;

    let empty = handle_request(
        panel_request("GET", "/api/config", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(empty.status(), 200);
    assert_eq!(body_json(&empty), serde_json::json!({}));

    let update = handle_request(
        panel_request(
            "PUT",
            "/api/config",
            Some(&cookie),
            Body::Text(
                r#"{"specialCountdown":{"enabled":true,"title":"Launch day","description":"","targetDate":"2026-12-31T00:00:00Z"}}"#
                    .to_string(),
            ),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(update.status(), 200);

    let read_back = handle_request(
        panel_request("GET", "/api/config", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(body_json(&read_back)["specialCountdown"]["title"], "Launch day");

    let media = handle_request(
        panel_request("GET", "/api/media", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(media.status(), 200);
    assert!(body_json(&media).as_array().unwrap().len() > 1);
}

#[tokio::test]
async fn announcement_permissions_follow_the_games_studio() {
    let (kv, state) = test_state();
    seed_scoped_world(&kv).await;

    let admin = login(&state, "admin", "northgate-dev").await;
    let scoped = login(&state, "scoped", "scoped-pw").await;

    // Unknown game reference is rejected up front.
    let unknown = handle_request(
        panel_request(
            "POST",
            "/api/announcements",
            Some(&admin),
            Body::Text(r#"{"gameId":"game-nope","title":"Oops","active":true}"#.to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(unknown.status(), 400);

    let created = handle_request(
        panel_request(
            "POST",
            "/api/announcements",
            Some(&admin),
            Body::Text(r#"{"gameId":"game-b","title":"Bravo update","active":true}"#.to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(created.status(), 201);
    let id = body_json(&created)["id"].as_str().unwrap().to_string();

    // Studio A's editor may not touch an announcement for Studio B's game.
    let denied = handle_request(
        panel_request(
            "DELETE",
            &format!("/api/announcements/{}", id),
            Some(&scoped),
            Body::Empty,
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(denied.status(), 403);

    // Re-pointing an announcement at another studio's game checks both ends.
    let scoped_created = handle_request(
        panel_request(
            "POST",
            "/api/announcements",
            Some(&scoped),
            Body::Text(
                r#"{"id":"notification-alpha","gameId":"game-a","title":"Alpha update","active":true}"#
                    .to_string(),
            ),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(scoped_created.status(), 201);
    let scoped_id = body_json(&scoped_created)["id"].as_str().unwrap().to_string();

    let repoint = handle_request(
        panel_request(
            "PUT",
            &format!("/api/announcements/{}", scoped_id),
            Some(&scoped),
            Body::Text(r#"{"gameId":"game-b"}"#.to_string()),
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(repoint.status(), 403);

    let removed = handle_request(
        panel_request(
            "DELETE",
            &format!("/api/announcements/{}", id),
            Some(&admin),
            Body::Empty,
        ),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(removed.status(), 200);
}

#[tokio::test]
async fn panel_serves_spa_shell_when_authenticated() {
    let kv = Arc::new(MemoryKv::default());
    let state = AppState {
        collections: Collections::new(kv.clone()),
        sessions: Arc::new(MemorySessions::default()),
        assets: Arc::new(
            MemoryAssets::default().with_file("/panel/index.html", b"<html>panel shell</html>"),
        ),
    };

    let cookie = login(&state, "admin", "northgate-dev").await;
    let shell = handle_request(
        panel_request("GET", "/games/edit", Some(&cookie), Body::Empty),
        &state,
    )
    .await
    .unwrap();
    assert_eq!(shell.status(), 200);
    assert!(body_string(&shell).contains("panel shell"));
}
