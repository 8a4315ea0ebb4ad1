use crate::error::{config_error, env_error, ClientResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Default location of the component toggles file
pub const COMPONENTS_FILE: &str = "config/components.toml";

/// Where access and refresh tokens are kept between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    Memory,
    File,
    Redis,
}

impl FromStr for TokenStoreKind {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(TokenStoreKind::Memory),
            "file" => Ok(TokenStoreKind::File),
            "redis" => Ok(TokenStoreKind::Redis),
            other => Err(config_error(&format!("Unknown token store: {}", other))),
        }
    }
}

/// Main configuration structure for the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the backend, without the `/api` prefix
    pub api_base_url: String,
    /// IANA timezone used for all calendar-day math
    pub timezone: String,
    /// Token storage backend
    pub token_store: TokenStoreKind,
    /// Session file used by the file token store
    pub session_file: PathBuf,
    /// Redis URL used by the redis token store
    pub redis_url: String,
    /// Seconds between notification polls
    pub notification_poll_interval: u64,
    /// Number of notifications fetched per poll
    pub notification_limit: u32,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        let mut components = HashMap::new();
        components.insert("notification_poller".to_string(), true);

        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            timezone: "UTC".to_string(),
            token_store: TokenStoreKind::File,
            session_file: PathBuf::from("config/session.json"),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            notification_poll_interval: 30,
            notification_limit: 10,
            components,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> ClientResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let api_base_url = env::var("SORTIE_API_URL").map_err(|_| env_error("SORTIE_API_URL"))?;
        let api_base_url = normalize_base_url(&api_base_url)?;

        let timezone = env::var("TIMEZONE").unwrap_or(defaults.timezone);
        // Fail early on a bad zone rather than on the first calendar render
        timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Invalid TIMEZONE: {}", timezone)))?;

        let token_store = match env::var("TOKEN_STORE") {
            Ok(value) => value.parse::<TokenStoreKind>()?,
            Err(_) => defaults.token_store,
        };

        let session_file = env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        let redis_url = env::var("REDIS_URL").unwrap_or(defaults.redis_url);

        let notification_poll_interval = match env::var("NOTIFICATION_POLL_INTERVAL") {
            Ok(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| env_error("Invalid NOTIFICATION_POLL_INTERVAL format"))?,
            Err(_) => defaults.notification_poll_interval,
        };

        let notification_limit = match env::var("NOTIFICATION_LIMIT") {
            Ok(value) => value
                .parse::<u32>()
                .map_err(|_| env_error("Invalid NOTIFICATION_LIMIT format"))?,
            Err(_) => defaults.notification_limit,
        };

        let mut components = defaults.components;

        merge_components_file(&mut components, Path::new(COMPONENTS_FILE));

        Ok(Config {
            api_base_url,
            timezone,
            token_store,
            session_file,
            redis_url,
            notification_poll_interval,
            notification_limit,
            components,
        })
    }

    /// Parsed timezone, falling back to UTC on a bad value
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}

/// Merge component toggles from a TOML file; a missing or unreadable file changes nothing
fn merge_components_file(components: &mut HashMap<String, bool>, path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<HashMap<String, bool>>(&content) {
        Ok(file_components) => components.extend(file_components),
        Err(e) => warn!("Ignoring {}: {}", path.display(), e),
    }
}

/// Strip trailing slashes and make sure the URL parses
pub fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    url::Url::parse(trimmed)
        .map_err(|e| config_error(&format!("Invalid SORTIE_API_URL {}: {}", raw, e)))?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.example.com///").unwrap(),
            "https://api.example.com"
        );
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_token_store_kind_parse() {
        assert_eq!("FILE".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::File);
        assert_eq!(" redis ".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::Redis);
        assert!("sqlite".parse::<TokenStoreKind>().is_err());
    }

    #[test]
    fn test_components_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("components.toml");
        fs::write(&path, "notification_poller = false\nextra = true\n").unwrap();

        let mut components = Config::default().components;
        merge_components_file(&mut components, &path);
        assert_eq!(components.get("notification_poller"), Some(&false));
        assert_eq!(components.get("extra"), Some(&true));

        // Broken and missing files are ignored
        fs::write(&path, "notification_poller = ").unwrap();
        let mut components = Config::default().components;
        merge_components_file(&mut components, &path);
        merge_components_file(&mut components, &dir.path().join("missing.toml"));
        assert_eq!(components.get("notification_poller"), Some(&true));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.is_component_enabled("notification_poller"));
        assert!(!config.is_component_enabled("unknown"));
        assert_eq!(config.tz(), Tz::UTC);
        assert_eq!(config.notification_poll_interval, 30);
    }
}
