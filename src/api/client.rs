use super::models::{RefreshRequest, RefreshResponse};
use super::single_flight::SingleFlight;
use super::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
use super::REFRESH_PATH;
use crate::config::Config;
use crate::error::{decode_error, ClientResult, Error};
use crate::session::{Authorization, SessionManager};
use chrono::Utc;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Authenticated client for the calendar backend.
///
/// Every request carries the stored access token. A 401 triggers one refresh, shared by
/// every request that fails while it is running, and one retry with the new token.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    sessions: SessionManager,
    refresh: Arc<SingleFlight<String>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("refresh_in_flight", &self.refresh.in_flight())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, sessions: SessionManager) -> Self {
        Self {
            transport,
            sessions,
            refresh: Arc::new(SingleFlight::new()),
        }
    }

    /// Build a reqwest-backed client and the configured token store
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(&config.api_base_url)?;
        let sessions = SessionManager::from_config(config)?;
        info!("API client ready for {}", config.api_base_url);
        Ok(Self::new(Arc::new(transport), sessions))
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Send a request through the authentication pipeline
    pub async fn execute(&self, mut request: ApiRequest) -> ClientResult<ApiResponse> {
        request.bearer = self.sessions.access_token().await?;

        // Transport failures come back as they are
        let response = self.transport.send(&request).await?;

        if response.status != StatusCode::UNAUTHORIZED
            || request.is_retry
            || request.is_refresh_call()
        {
            return response.into_result();
        }

        debug!("{} {} was rejected, refreshing session", request.method, request.path);
        let access_token = self.recover_session().await?;

        request.is_retry = true;
        request.bearer = Some(access_token);
        self.transport.send(&request).await?.into_result()
    }

    /// Send a request without credentials or refresh handling
    pub async fn execute_anonymous(&self, mut request: ApiRequest) -> ClientResult<ApiResponse> {
        request.bearer = None;
        self.transport.send(&request).await?.into_result()
    }

    /// Execute and decode the JSON body
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        self.execute(request).await?.json()
    }

    /// Execute and ignore the body
    pub async fn submit(&self, request: ApiRequest) -> ClientResult<()> {
        self.execute(request).await.map(|_| ())
    }

    /// Refresh an expired session before it is used.
    ///
    /// Returns the authorization state after any refresh.
    pub async fn ensure_authorized(&self) -> ClientResult<Authorization> {
        match self.sessions.authorization(Utc::now()).await? {
            Authorization::Expired => {
                info!("Access token expired, refreshing");
                self.recover_session().await?;
                self.sessions.authorization(Utc::now()).await
            }
            state => Ok(state),
        }
    }

    async fn recover_session(&self) -> ClientResult<String> {
        let Some(refresh_token) = self.sessions.refresh_token().await? else {
            warn!("No refresh token stored, clearing session");
            self.sessions.clear().await?;
            return Err(Error::Unauthorized);
        };

        let transport = Arc::clone(&self.transport);
        let sessions = self.sessions.clone();
        self.refresh
            .run(move || async move {
                info!("Refreshing access token");
                match request_access_token(transport.as_ref(), refresh_token).await {
                    Ok(access_token) => {
                        sessions.replace_access_token(&access_token).await?;
                        info!("Access token refreshed");
                        Ok(access_token)
                    }
                    Err(e) => {
                        warn!("Token refresh failed: {}", e);
                        if let Err(clear_err) = sessions.clear().await {
                            error!("Failed to clear session after refresh failure: {}", clear_err);
                        }
                        Err(e)
                    }
                }
            })
            .await
            .map_err(Error::RefreshFailed)
    }
}

async fn request_access_token(transport: &dyn Transport, refresh: String) -> ClientResult<String> {
    let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest { refresh })?;
    let response = transport.send(&request).await?.into_result()?;
    let body: RefreshResponse = response.json()?;
    body.access
        .filter(|token| !token.is_empty())
        .ok_or_else(|| decode_error("Refresh response has no access token"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{encode_test_token, MemoryTokenStore, TokenKind, TokenStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Transport that answers from a script and records what it saw
    struct ScriptedTransport {
        valid_token: String,
        refresh_reply: Mutex<Option<ClientResult<ApiResponse>>>,
        refresh_gate: Option<Arc<Notify>>,
        refresh_calls: AtomicUsize,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        fn new(valid_token: &str, refresh_reply: ClientResult<ApiResponse>) -> Self {
            Self {
                valid_token: valid_token.to_string(),
                refresh_reply: Mutex::new(Some(refresh_reply)),
                refresh_gate: None,
                refresh_calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.refresh_gate = Some(gate);
            self
        }

        fn seen(&self) -> Vec<ApiRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
            self.seen.lock().unwrap().push(request.clone());

            if request.is_refresh_call() {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &self.refresh_gate {
                    gate.notified().await;
                }
                let reply = self.refresh_reply.lock().unwrap().take();
                return reply.unwrap_or_else(|| Err(Error::Other("refresh called twice".into())));
            }

            if request.path == "/api/offline/" {
                return Err(Error::Network("connection refused".into()));
            }

            if request.bearer.as_deref() == Some(self.valid_token.as_str()) {
                Ok(ApiResponse::new(StatusCode::OK, r#"{"ok":true}"#))
            } else {
                Ok(ApiResponse::new(
                    StatusCode::UNAUTHORIZED,
                    r#"{"detail":"Given token not valid for any token type"}"#,
                ))
            }
        }
    }

    fn refresh_ok(token: &str) -> ClientResult<ApiResponse> {
        Ok(ApiResponse::new(
            StatusCode::OK,
            json!({ "access": token }).to_string(),
        ))
    }

    fn client_with(
        transport: Arc<ScriptedTransport>,
        store: MemoryTokenStore,
    ) -> ApiClient {
        ApiClient::new(transport, SessionManager::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_valid_token_is_attached() {
        let transport = Arc::new(ScriptedTransport::new("good", refresh_ok("unused")));
        let client = client_with(transport.clone(), MemoryTokenStore::with_tokens("good", "r"));

        let body: serde_json::Value = client.fetch(ApiRequest::get("/api/events/")).await.unwrap();
        assert_eq!(body, json!({"ok": true}));

        let seen = transport.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].bearer.as_deref(), Some("good"));
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_token_sends_unauthenticated() {
        let transport = Arc::new(ScriptedTransport::new("good", refresh_ok("unused")));
        let client = client_with(transport.clone(), MemoryTokenStore::new());

        let err = client.execute(ApiRequest::get("/api/events/")).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert_eq!(transport.seen()[0].bearer, None);
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_and_retries_once() {
        let transport = Arc::new(ScriptedTransport::new("fresh", refresh_ok("fresh")));
        let store = MemoryTokenStore::with_tokens("stale", "refresh-1");
        let client = client_with(transport.clone(), store.clone());

        client.submit(ApiRequest::get("/api/events/")).await.unwrap();

        let seen = transport.seen();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].bearer.as_deref(), Some("stale"));
        assert!(seen[1].is_refresh_call());
        assert_eq!(seen[1].bearer, None);
        assert_eq!(seen[1].body, Some(json!({"refresh": "refresh-1"})));
        assert!(seen[2].is_retry);
        assert_eq!(seen[2].bearer.as_deref(), Some("fresh"));

        assert_eq!(
            store.get(TokenKind::Access).await.unwrap().as_deref(),
            Some("fresh")
        );
        assert_eq!(
            store.get(TokenKind::Refresh).await.unwrap().as_deref(),
            Some("refresh-1")
        );
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let gate = Arc::new(Notify::new());
        let transport = Arc::new(
            ScriptedTransport::new("token-2", refresh_ok("token-2")).gated(Arc::clone(&gate)),
        );
        let client = client_with(transport.clone(), MemoryTokenStore::with_tokens("token-1", "r"));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let client = client.clone();
            tasks.push(tokio::spawn(async move {
                client.submit(ApiRequest::get("/api/events/")).await
            }));
        }

        // Wait until all four first attempts failed and are parked on the refresh
        loop {
            let first_attempts = transport
                .seen()
                .iter()
                .filter(|r| !r.is_refresh_call() && !r.is_retry)
                .count();
            if first_attempts == 4 && client.refresh.in_flight() {
                break;
            }
            tokio::task::yield_now().await;
        }
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
        let retries: Vec<_> = transport.seen().into_iter().filter(|r| r.is_retry).collect();
        assert_eq!(retries.len(), 4);
        assert!(retries.iter().all(|r| r.bearer.as_deref() == Some("token-2")));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_clears_session() {
        let transport = Arc::new(ScriptedTransport::new("good", refresh_ok("unused")));
        let store = MemoryTokenStore::new();
        store.set(TokenKind::Access, "stale").await.unwrap();
        let client = client_with(transport.clone(), store.clone());

        let err = client.submit(ApiRequest::get("/api/events/")).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.get(TokenKind::Access).await.unwrap(), None);
        assert_eq!(store.get(TokenKind::Refresh).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_session_and_surfaces_refresh_error() {
        let transport = Arc::new(ScriptedTransport::new(
            "good",
            Ok(ApiResponse::new(
                StatusCode::UNAUTHORIZED,
                r#"{"detail":"Token is blacklisted"}"#,
            )),
        ));
        let store = MemoryTokenStore::with_tokens("stale", "revoked");
        let client = client_with(transport.clone(), store.clone());

        let err = client.submit(ApiRequest::get("/api/events/")).await.unwrap_err();
        match err {
            Error::RefreshFailed(inner) => assert!(matches!(inner.as_ref(), Error::Unauthorized)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.get(TokenKind::Access).await.unwrap().is_none());
        assert!(store.get(TokenKind::Refresh).await.unwrap().is_none());
        // No retry after a failed refresh
        assert!(transport.seen().iter().all(|r| !r.is_retry));
    }

    #[tokio::test]
    async fn test_empty_access_in_refresh_response_is_a_failure() {
        let transport = Arc::new(ScriptedTransport::new("good", refresh_ok("")));
        let store = MemoryTokenStore::with_tokens("stale", "r");
        let client = client_with(transport, store.clone());

        let err = client.submit(ApiRequest::get("/api/events/")).await.unwrap_err();
        match err {
            Error::RefreshFailed(inner) => assert!(matches!(inner.as_ref(), Error::Decode(_))),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.get(TokenKind::Refresh).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retry_rejected_again_is_unauthorized() {
        // The refreshed token is still not the one the server accepts
        let transport = Arc::new(ScriptedTransport::new("good", refresh_ok("also-bad")));
        let client = client_with(transport.clone(), MemoryTokenStore::with_tokens("bad", "r"));

        let err = client.submit(ApiRequest::get("/api/events/")).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.seen().len(), 3);
    }

    #[tokio::test]
    async fn test_network_errors_are_not_retried() {
        let transport = Arc::new(ScriptedTransport::new("good", refresh_ok("unused")));
        let client = client_with(transport.clone(), MemoryTokenStore::with_tokens("good", "r"));

        let err = client.submit(ApiRequest::get("/api/offline/")).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_authorized_refreshes_expired_token() {
        let now = Utc::now().timestamp();
        let expired = encode_test_token(now - 60, 3);
        let fresh = encode_test_token(now + 3600, 3);
        let transport = Arc::new(ScriptedTransport::new(&fresh, refresh_ok(&fresh)));
        let client = client_with(transport.clone(), MemoryTokenStore::with_tokens(&expired, "r"));

        let state = client.ensure_authorized().await.unwrap();
        assert!(matches!(state, Authorization::Authorized(claims) if claims.user_id == Some(3)));
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
    }
}
