use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::RngCore;
use tokio::sync::Mutex;
use tracing::info;

use crate::models::Role;

pub const SESSION_COOKIE: &str = "panel_session";
pub const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub allowed_studios: Vec<String>,
    /// Absolute expiry, epoch milliseconds.
    pub expires: i64,
}

/// Panel session tracking. Backed by process memory here; the trait keeps
/// call sites unchanged if sessions move to a shared store. An unknown
/// token and an expired token are indistinguishable to callers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, username: &str, role: Role, allowed_studios: Vec<String>) -> Session;
    async fn validate(&self, token: &str) -> Option<Session>;
    async fn destroy(&self, token: &str);
}

#[derive(Default)]
pub struct MemorySessions {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessions {
    pub async fn create_at(
        &self,
        username: &str,
        role: Role,
        allowed_studios: Vec<String>,
        now_ms: i64,
    ) -> Session {
        let session = Session {
            token: new_token(),
            username: username.to_string(),
            role,
            allowed_studios,
            expires: now_ms + SESSION_TTL_MS,
        };
        self.sessions
            .lock()
            .await
            .insert(session.token.clone(), session.clone());
        info!("Created session for user: {}", username);
        session
    }

    /// Expired entries are evicted here, on access; there is no sweeper.
    pub async fn validate_at(&self, token: &str, now_ms: i64) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(token) {
            Some(session) if now_ms > session.expires => {
                sessions.remove(token);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn create(&self, username: &str, role: Role, allowed_studios: Vec<String>) -> Session {
        self.create_at(username, role, allowed_studios, Utc::now().timestamp_millis())
            .await
    }

    async fn validate(&self, token: &str) -> Option<Session> {
        self.validate_at(token, Utc::now().timestamp_millis()).await
    }

    async fn destroy(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=86400",
        SESSION_COOKIE, token
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Pull the session token out of a `Cookie` request header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE).and_then(|rest| rest.strip_prefix('=')))
        .filter(|token| !token.is_empty())
}
