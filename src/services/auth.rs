use crate::api::models::{LoginRequest, RegisterRequest, RegisteredUser, TokenPair};
use crate::api::{ApiClient, ApiRequest, LOGIN_PATH, REGISTER_PATH};
use crate::error::{ClientResult, Error};
use crate::session::{Authorization, Session};
use tracing::info;

/// Login, registration and logout
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Obtain a token pair and store it as the current session
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Session> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let pair: TokenPair = match self.client.execute_anonymous(request).await {
            Ok(response) => response.json()?,
            // A 401 here means bad credentials, not an expired session
            Err(Error::Unauthorized) => {
                return Err(Error::Validation("Invalid username or password.".to_string()))
            }
            Err(e) => return Err(e),
        };

        let session = Session {
            access_token: pair.access,
            refresh_token: pair.refresh,
        };
        self.client.sessions().start(&session).await?;
        info!("Logged in as {}", username);
        Ok(session)
    }

    /// Create an account. Any stored session is dropped before the request is sent.
    pub async fn register(&self, registration: &RegisterRequest) -> ClientResult<RegisteredUser> {
        self.client.sessions().clear().await?;
        let request = ApiRequest::post(REGISTER_PATH).json(registration)?;
        let user: RegisteredUser = self.client.execute_anonymous(request).await?.json()?;
        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.client.sessions().clear().await
    }

    /// Session state, refreshing an expired access token first
    pub async fn status(&self) -> ClientResult<Authorization> {
        self.client.ensure_authorized().await
    }
}
