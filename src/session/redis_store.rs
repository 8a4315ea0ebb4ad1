use super::store::{TokenKind, TokenStore};
use crate::error::{storage_error, ClientResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient};
use tokio::sync::OnceCell;
use tracing::info;

// Redis key constants
pub mod keys {
    pub const PREFIX: &str = "sortie";
}

/// Token store backed by Redis, shared by every client pointing at the same server
pub struct RedisTokenStore {
    client: RedisClient,
    namespace: String,
    connection: OnceCell<ConnectionManager>,
}

impl RedisTokenStore {
    /// Create a store; the connection is opened lazily on first use
    pub fn new(redis_url: &str, namespace: &str) -> ClientResult<Self> {
        let client = RedisClient::open(redis_url)
            .map_err(|e| storage_error(&format!("Failed to create Redis client: {}", e)))?;

        Ok(Self {
            client,
            namespace: namespace.to_string(),
            connection: OnceCell::new(),
        })
    }

    /// Full Redis key for a token
    pub fn key_for(&self, kind: TokenKind) -> String {
        format!("{}:{}:{}", keys::PREFIX, self.namespace, kind.key())
    }

    async fn connection(&self) -> ClientResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                info!("Connecting token store to Redis");
                ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|e| storage_error(&format!("Failed to connect to Redis: {}", e)))
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn get(&self, kind: TokenKind) -> ClientResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .get(self.key_for(kind))
            .await
            .map_err(|e| storage_error(&format!("Failed to read token from Redis: {}", e)))?;
        Ok(value)
    }

    async fn set(&self, kind: TokenKind, value: &str) -> ClientResult<()> {
        let mut conn = self.connection().await?;
        () = conn
            .set(self.key_for(kind), value)
            .await
            .map_err(|e| storage_error(&format!("Failed to save token to Redis: {}", e)))?;
        Ok(())
    }

    async fn remove(&self, kind: TokenKind) -> ClientResult<()> {
        let mut conn = self.connection().await?;
        () = conn
            .del(self.key_for(kind))
            .await
            .map_err(|e| storage_error(&format!("Failed to delete token from Redis: {}", e)))?;
        Ok(())
    }
}
