use miette::Diagnostic;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for the client
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Network error: {0}")]
    #[diagnostic(code(sortie::network), help("Check that the API server is reachable"))]
    Network(String),

    #[error("Not authenticated")]
    #[diagnostic(code(sortie::unauthorized), help("Run `sortie login` to start a new session"))]
    Unauthorized,

    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(sortie::api))]
    Api { status: StatusCode, message: String },

    #[error("{0}")]
    #[diagnostic(code(sortie::validation))]
    Validation(String),

    #[error("Token refresh failed: {0}")]
    #[diagnostic(code(sortie::refresh), help("Your session was cleared, log in again"))]
    RefreshFailed(Arc<Error>),

    #[error("Unexpected response from server: {0}")]
    #[diagnostic(code(sortie::decode))]
    Decode(String),

    #[error("Token storage error: {0}")]
    #[diagnostic(code(sortie::storage))]
    Storage(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(sortie::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(sortie::config))]
    Config(String),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(sortie::serialization))]
    Serialization(String),

    #[error(transparent)]
    #[diagnostic(code(sortie::io))]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    #[diagnostic(code(sortie::cancelled))]
    Cancelled,

    #[error("Other error: {0}")]
    #[diagnostic(code(sortie::other))]
    Other(String),
}

impl Error {
    /// Build an API error from a non-success response body.
    ///
    /// 400 and 422 responses carry field errors and become `Validation`.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let message = match &parsed {
            Some(value) => flatten_error_body(value),
            None if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("Request failed.")
                .to_string(),
            None => body.trim().to_string(),
        };

        if status == StatusCode::UNAUTHORIZED {
            return Error::Unauthorized;
        }
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Error::Validation(message);
        }
        Error::Api { status, message }
    }

    /// Text suitable for showing to a user
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) => "Request failed. Check your connection and try again.".to_string(),
            Error::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Error::RefreshFailed(_) => "Your session has expired. Please log in again.".to_string(),
            Error::Validation(message) => message.clone(),
            Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// True when the session is gone and the user has to log in again
    pub fn requires_login(&self) -> bool {
        matches!(self, Error::Unauthorized | Error::RefreshFailed(_))
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type ClientResult<T> = Result<T, Error>;

/// Flatten a server error body into a single string.
///
/// Strings are used as they are, `{"detail": ..}` yields the detail and any other
/// object has its values flattened and joined with spaces, ordered by field name.
pub fn flatten_error_body(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        Value::Object(map) => {
            if let Some(Value::String(detail)) = map.get("detail") {
                return detail.clone();
            }
            let mut parts = Vec::new();
            for value in map.values() {
                collect_messages(value, &mut parts);
            }
            if parts.is_empty() {
                "Request failed.".to_string()
            } else {
                parts.join(" ")
            }
        }
        Value::Array(_) => {
            let mut parts = Vec::new();
            collect_messages(body, &mut parts);
            parts.join(" ")
        }
        Value::Null => "Request failed.".to_string(),
        other => other.to_string(),
    }
}

fn collect_messages(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) => out.push(text.clone()),
        Value::Array(items) => {
            for item in items {
                collect_messages(item, out);
            }
        }
        Value::Object(map) => {
            for nested in map.values() {
                collect_messages(nested, out);
            }
        }
        Value::Null => {}
        other => out.push(other.to_string()),
    }
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create token storage errors
pub fn storage_error(message: &str) -> Error {
    Error::Storage(message.to_string())
}

/// Helper to create decode errors
pub fn decode_error(message: &str) -> Error {
    Error::Decode(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
