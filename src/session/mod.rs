mod redis_store;
mod store;

pub use redis_store::RedisTokenStore;
pub use store::{FileTokenStore, MemoryTokenStore, TokenKind, TokenStore};

use crate::config::{Config, TokenStoreKind};
use crate::error::{decode_error, ClientResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Access and refresh token pair
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

// Tokens never end up in logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Claims carried in the payload of an access token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    pub exp: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// The server is the only party that verifies tokens; the client only reads `exp`.
pub fn decode_claims(token: &str) -> ClientResult<TokenClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| decode_error("Access token is not a JWT"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| decode_error(&format!("Invalid token payload encoding: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| decode_error(&format!("Invalid token payload: {}", e)))
}

/// Result of checking the stored session before showing protected views
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    /// No access token stored
    Unauthenticated,
    /// Access token present but past its `exp`
    Expired,
    /// Access token present and not expired
    Authorized(TokenClaims),
}

/// Owns the stored session tokens.
///
/// One instance is built per process and handed to the API client by `Arc`.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Build the token store selected in the configuration
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let store: Arc<dyn TokenStore> = match config.token_store {
            TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
            TokenStoreKind::File => Arc::new(FileTokenStore::new(&config.session_file)),
            TokenStoreKind::Redis => Arc::new(RedisTokenStore::new(
                &config.redis_url,
                &config.api_base_url,
            )?),
        };
        info!("Using {:?} token store", config.token_store);
        Ok(Self::new(store))
    }

    pub async fn access_token(&self) -> ClientResult<Option<String>> {
        self.token(TokenKind::Access).await
    }

    pub async fn refresh_token(&self) -> ClientResult<Option<String>> {
        self.token(TokenKind::Refresh).await
    }

    // Empty strings count as missing
    async fn token(&self, kind: TokenKind) -> ClientResult<Option<String>> {
        Ok(self
            .store
            .get(kind)
            .await?
            .filter(|token| !token.trim().is_empty()))
    }

    /// Store a fresh session after login
    pub async fn start(&self, session: &Session) -> ClientResult<()> {
        self.store
            .set(TokenKind::Access, &session.access_token)
            .await?;
        self.store
            .set(TokenKind::Refresh, &session.refresh_token)
            .await?;
        info!("Session started");
        Ok(())
    }

    /// Replace the access token after a refresh
    pub async fn replace_access_token(&self, token: &str) -> ClientResult<()> {
        self.store.set(TokenKind::Access, token).await?;
        debug!("Access token replaced");
        Ok(())
    }

    /// Drop both tokens
    pub async fn clear(&self) -> ClientResult<()> {
        self.store.remove(TokenKind::Access).await?;
        self.store.remove(TokenKind::Refresh).await?;
        info!("Session cleared");
        Ok(())
    }

    /// Both tokens, when both are stored
    pub async fn current(&self) -> ClientResult<Option<Session>> {
        let access = self.access_token().await?;
        let refresh = self.refresh_token().await?;
        Ok(match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Some(Session {
                access_token,
                refresh_token,
            }),
            _ => None,
        })
    }

    /// Check the stored access token against `now`.
    ///
    /// A token whose payload cannot be decoded is treated as expired so that the
    /// caller goes through a refresh instead of sending it.
    pub async fn authorization(&self, now: DateTime<Utc>) -> ClientResult<Authorization> {
        let Some(token) = self.access_token().await? else {
            return Ok(Authorization::Unauthenticated);
        };

        match decode_claims(&token) {
            Ok(claims) if !claims.is_expired(now) => Ok(Authorization::Authorized(claims)),
            Ok(_) => Ok(Authorization::Expired),
            Err(e) => {
                debug!("Stored access token is unreadable: {}", e);
                Ok(Authorization::Expired)
            }
        }
    }
}

/// Build an unsigned JWT-shaped token, for tests
#[doc(hidden)]
pub fn encode_test_token(exp: i64, user_id: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({"exp": exp, "user_id": user_id, "token_type": "access"})
            .to_string()
            .as_bytes(),
    );
    format!("{}.{}.signature", header, payload)
}
