use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::models::{
    default_games, default_studios, default_users, migrate_genres, Game, Notification, SiteConfig,
    Studio, User,
};

pub const GAMES_KEY: &str = "games";
pub const STUDIOS_KEY: &str = "studios";
pub const NOTIFICATIONS_KEY: &str = "notifications";
pub const USERS_KEY: &str = "users";
pub const CONFIG_KEY: &str = "config";

/// Key-value backend holding one JSON document per key.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> ApiResult<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> ApiResult<()>;
}

// ============================================================================
// DynamoDB backend
// ============================================================================

pub struct DynamoKv {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoKv {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl KvBackend for DynamoKv {
    async fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(format!("DOC#{}", key)))
            .key("SK", AttributeValue::S("DOCUMENT".to_string()))
            .send()
            .await
            .map_err(|e| {
                error!("DynamoDB GetItem error for '{}': {:?}", key, e);
                ApiError::StoreError(format!("Failed to read '{}'", key))
            })?;

        Ok(result
            .item()
            .and_then(|item| item.get("document"))
            .and_then(|v| v.as_s().ok())
            .cloned())
    }

    async fn put(&self, key: &str, value: &str) -> ApiResult<()> {
        let mut item = HashMap::new();
        item.insert(
            "PK".to_string(),
            AttributeValue::S(format!("DOC#{}", key)),
        );
        item.insert("SK".to_string(), AttributeValue::S("DOCUMENT".to_string()));
        item.insert(
            "document".to_string(),
            AttributeValue::S(value.to_string()),
        );

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| {
                error!("DynamoDB PutItem error for '{}': {:?}", key, e);
                ApiError::StoreError(format!("Failed to write '{}'", key))
            })?;

        Ok(())
    }
}

// ============================================================================
// In-memory backend (tests, local runs)
// ============================================================================

#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> ApiResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Collection adapter
// ============================================================================

/// Loads and saves whole collections. Saves overwrite the full document with
/// no version check: when two writers race on the same collection, the last
/// write wins and the earlier one is lost.
#[derive(Clone)]
pub struct Collections {
    kv: Arc<dyn KvBackend>,
}

impl Collections {
    pub fn new(kv: Arc<dyn KvBackend>) -> Self {
        Self { kv }
    }

    /// Fetch the document under `key`, seeding it with `defaults` on first
    /// touch. The seeding write-through means a read of a fresh store
    /// mutates backing state once.
    async fn load<T>(&self, key: &str, defaults: T) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        match self.kv.get(key).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                error!("Corrupt document under '{}': {}", key, e);
                ApiError::StoreError(format!("Corrupt document under '{}'", key))
            }),
            None => {
                info!("Seeding collection '{}'", key);
                let raw = serde_json::to_string(&defaults).map_err(|e| {
                    ApiError::InternalError(format!("Failed to serialize defaults: {}", e))
                })?;
                self.kv.put(key, &raw).await?;
                Ok(defaults)
            }
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> ApiResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| {
            ApiError::InternalError(format!("Failed to serialize '{}': {}", key, e))
        })?;
        self.kv.put(key, &raw).await
    }

    pub async fn load_games(&self) -> ApiResult<Vec<Game>> {
        let mut games: Vec<Game> = self.load(GAMES_KEY, default_games()).await?;
        for game in &mut games {
            migrate_genres(game);
        }
        Ok(games)
    }

    pub async fn save_games(&self, games: &[Game]) -> ApiResult<()> {
        self.save(GAMES_KEY, &games).await
    }

    pub async fn load_studios(&self) -> ApiResult<Vec<Studio>> {
        self.load(STUDIOS_KEY, default_studios()).await
    }

    pub async fn load_notifications(&self) -> ApiResult<Vec<Notification>> {
        self.load(NOTIFICATIONS_KEY, Vec::new()).await
    }

    pub async fn save_notifications(&self, notifications: &[Notification]) -> ApiResult<()> {
        self.save(NOTIFICATIONS_KEY, &notifications).await
    }

    pub async fn load_users(&self) -> ApiResult<Vec<User>> {
        self.load(USERS_KEY, default_users()).await
    }

    pub async fn save_users(&self, users: &[User]) -> ApiResult<()> {
        self.save(USERS_KEY, &users).await
    }

    /// Config is the one collection with no seeding: an absent document
    /// simply means no special countdown is configured.
    pub async fn load_config(&self) -> ApiResult<SiteConfig> {
        match self.kv.get(CONFIG_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                error!("Corrupt document under '{}': {}", CONFIG_KEY, e);
                ApiError::StoreError(format!("Corrupt document under '{}'", CONFIG_KEY))
            }),
            None => Ok(SiteConfig::default()),
        }
    }

    pub async fn save_config(&self, config: &SiteConfig) -> ApiResult<()> {
        self.save(CONFIG_KEY, config).await
    }

    /// Raw document fetch for non-collection keys (legacy credential docs).
    pub async fn get_raw(&self, key: &str) -> ApiResult<Option<String>> {
        self.kv.get(key).await
    }
}
