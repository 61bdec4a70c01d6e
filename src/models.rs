use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Games
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    ComingSoon,
    Playable,
    Beta,
    InDevelopment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotifyAlbum {
    pub name: String,
    pub spotify_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Countdown,
    Event,
    Announcement,
}

/// Timed event embedded in a game record. Events with higher `priority`
/// take display precedence on the public site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_card: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_hero: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_countdown: Option<bool>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub description: String,
    pub owned_by: String,
    pub status: GameStatus,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Pre-migration records carried a single comma-separated `genre`
    /// string. Folded into `genres` on every read; never written back out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_albums: Option<Vec<SpotifyAlbum>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<GameEvent>>,
}

/// Partial update body for `PUT /api/games/:id`. Absent fields keep their
/// stored value; `id` is never patchable.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePatch {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub owned_by: Option<String>,
    pub status: Option<GameStatus>,
    pub genres: Option<Vec<String>>,
    pub genre: Option<String>,
    pub youtube_video_id: Option<String>,
    pub thumbnails: Option<Vec<String>>,
    pub spotify_albums: Option<Vec<SpotifyAlbum>>,
    pub link: Option<String>,
    pub order: Option<i64>,
    pub visible: Option<bool>,
    pub events: Option<Vec<GameEvent>>,
}

/// Fold the legacy comma-separated `genre` field into `genres`.
///
/// Idempotent: once `genre` is consumed it never reappears, and repeated
/// application leaves `genres` unchanged.
pub fn migrate_genres(game: &mut Game) {
    if let Some(legacy) = game.genre.take() {
        for part in legacy.split(',') {
            let trimmed = part.trim();
            if !trimmed.is_empty() && !game.genres.iter().any(|g| g == trimmed) {
                game.genres.push(trimmed.to_string());
            }
        }
    }
}

// ============================================================================
// Studios
// ============================================================================

/// Organizational owner of games. `name` is the join key used by
/// `Game::owned_by` and `User::allowed_studios` (exact string equality).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roblox: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
}

// ============================================================================
// Notifications (site-wide announcements)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    pub game_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPatch {
    pub game_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub countdown_to: Option<String>,
    pub youtube_video_id: Option<String>,
    pub link: Option<String>,
    pub active: Option<bool>,
}

impl Notification {
    /// Visible on the public site while active and not past its countdown.
    /// Unparseable countdown dates hide the record.
    pub fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        match &self.countdown_to {
            None => true,
            Some(raw) => match parse_countdown(raw) {
                Some(target) => target > now,
                None => false,
            },
        }
    }
}

/// Accepts full RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_countdown(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = raw.parse::<NaiveDate>().ok()?;
    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Panel account. `password` lives only in the store; every API response
/// goes through [`User::without_password`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub allowed_studios: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub password: Option<String>,
    pub role: Option<Role>,
    pub allowed_studios: Option<Vec<String>>,
}

impl User {
    pub fn without_password(mut self) -> User {
        self.password = None;
        self
    }
}

// ============================================================================
// Site config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_countdown: Option<SpecialCountdown>,
}

/// Full-screen takeover hero shown on the public site while enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialCountdown {
    #[serde(default)]
    pub enabled: bool,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_reveal_date: Option<String>,
}

// ============================================================================
// Identity minting and seed data
// ============================================================================

pub fn mint_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_millis())
}

/// Games shown before anyone has edited the catalog.
pub fn default_games() -> Vec<Game> {
    vec![
        Game {
            id: "game-starfall-outpost".to_string(),
            name: "Starfall Outpost".to_string(),
            logo: "/media/games/starfall-outpost-logo.png".to_string(),
            description: "Build and defend a frontier colony on a shattered moon.".to_string(),
            owned_by: "Northgate Interactive".to_string(),
            status: GameStatus::Playable,
            genres: vec!["Survival".to_string(), "Building".to_string()],
            genre: None,
            youtube_video_id: Some("dQw4w9WgXcQ".to_string()),
            thumbnails: Some(vec![
                "/media/games/starfall-outpost-1.jpg".to_string(),
                "/media/games/starfall-outpost-2.jpg".to_string(),
            ]),
            spotify_albums: None,
            link: Some("https://www.roblox.com/games/starfall-outpost".to_string()),
            order: Some(1),
            visible: Some(true),
            events: None,
        },
        Game {
            id: "game-hollow-harbor".to_string(),
            name: "Hollow Harbor".to_string(),
            logo: "/media/games/hollow-harbor-logo.png".to_string(),
            description: "A story-driven mystery set in a fog-bound fishing town.".to_string(),
            owned_by: "Driftline Studios".to_string(),
            status: GameStatus::ComingSoon,
            genres: vec!["Adventure".to_string(), "Mystery".to_string()],
            genre: None,
            youtube_video_id: None,
            thumbnails: Some(vec!["/media/games/hollow-harbor-1.jpg".to_string()]),
            spotify_albums: None,
            link: None,
            order: Some(2),
            visible: Some(true),
            events: None,
        },
    ]
}

pub fn default_studios() -> Vec<Studio> {
    vec![
        Studio {
            id: "studio-northgate".to_string(),
            name: "Northgate Interactive".to_string(),
            description: Some("Flagship studio behind Starfall Outpost.".to_string()),
            logo: Some("/media/studios/northgate-logo.png".to_string()),
            thumbnail: Some("/media/studios/northgate-thumb.jpg".to_string()),
            hero: Some(true),
            media: Some(vec!["/media/studios/northgate-banner.jpg".to_string()]),
            discord: Some("https://discord.gg/northgate".to_string()),
            roblox: Some("https://www.roblox.com/groups/northgate".to_string()),
            youtube: Some("https://www.youtube.com/@northgate".to_string()),
        },
        Studio {
            id: "studio-driftline".to_string(),
            name: "Driftline Studios".to_string(),
            description: Some("Narrative team working on Hollow Harbor.".to_string()),
            logo: Some("/media/studios/driftline-logo.png".to_string()),
            thumbnail: None,
            hero: Some(false),
            media: None,
            discord: None,
            roblox: Some("https://www.roblox.com/groups/driftline".to_string()),
            youtube: None,
        },
    ]
}

/// Bootstrap accounts for a fresh deployment; rotate the passwords through
/// `/api/users` after first login.
pub fn default_users() -> Vec<User> {
    vec![
        User {
            username: "admin".to_string(),
            password: Some("northgate-dev".to_string()),
            role: Role::Admin,
            allowed_studios: vec!["*".to_string()],
        },
        User {
            username: "siteops".to_string(),
            password: Some("siteops-dev".to_string()),
            role: Role::Admin,
            allowed_studios: vec!["*".to_string()],
        },
    ]
}
