use crate::error::{storage_error, ClientResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// The two tokens a session is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Key under which the token is stored
    pub fn key(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Key/value storage for session tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read a token; `None` when it was never stored or has been removed
    async fn get(&self, kind: TokenKind) -> ClientResult<Option<String>>;

    /// Store or replace a token
    async fn set(&self, kind: TokenKind, value: &str) -> ClientResult<()>;

    /// Remove a token; removing a missing token is not an error
    async fn remove(&self, kind: TokenKind) -> ClientResult<()>;
}

/// Process-local store, used by tests and `TOKEN_STORE=memory`
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    data: Arc<Mutex<HashMap<TokenKind, String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds both tokens
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let mut data = HashMap::new();
        data.insert(TokenKind::Access, access.to_string());
        data.insert(TokenKind::Refresh, refresh.to_string());
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, kind: TokenKind) -> ClientResult<Option<String>> {
        Ok(self.data.lock().await.get(&kind).cloned())
    }

    async fn set(&self, kind: TokenKind, value: &str) -> ClientResult<()> {
        self.data.lock().await.insert(kind, value.to_string());
        Ok(())
    }

    async fn remove(&self, kind: TokenKind) -> ClientResult<()> {
        self.data.lock().await.remove(&kind);
        Ok(())
    }
}

/// JSON file holding the tokens, the CLI equivalent of browser local storage
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Arc<Mutex<()>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> ClientResult<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                storage_error(&format!(
                    "Failed to parse session file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, data: &HashMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Session file {} updated", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, kind: TokenKind) -> ClientResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(kind.key()))
    }

    async fn set(&self, kind: TokenKind, value: &str) -> ClientResult<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.read_all().await?;
        data.insert(kind.key().to_string(), value.to_string());
        self.write_all(&data).await
    }

    async fn remove(&self, kind: TokenKind) -> ClientResult<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.read_all().await?;
        if data.remove(kind.key()).is_some() {
            self.write_all(&data).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(TokenKind::Access).await.unwrap(), None);

        store.set(TokenKind::Access, "a1").await.unwrap();
        assert_eq!(store.get(TokenKind::Access).await.unwrap().as_deref(), Some("a1"));

        store.remove(TokenKind::Access).await.unwrap();
        store.remove(TokenKind::Access).await.unwrap();
        assert_eq!(store.get(TokenKind::Access).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");

        let store = FileTokenStore::new(&path);
        assert_eq!(store.get(TokenKind::Refresh).await.unwrap(), None);
        store.set(TokenKind::Access, "access-1").await.unwrap();
        store.set(TokenKind::Refresh, "refresh-1").await.unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(
            reopened.get(TokenKind::Access).await.unwrap().as_deref(),
            Some("access-1")
        );
        assert_eq!(
            reopened.get(TokenKind::Refresh).await.unwrap().as_deref(),
            Some("refresh-1")
        );

        reopened.remove(TokenKind::Access).await.unwrap();
        assert_eq!(store.get(TokenKind::Access).await.unwrap(), None);
        assert!(store.get(TokenKind::Refresh).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.get(TokenKind::Access).await.is_err());
    }
}
