use chrono::{Duration, Utc};
use clap::Parser;
use sortie::api::{ApiClient, ReqwestTransport};
use sortie::commands::{Cli, Command, GoogleAction};
use sortie::components::{ComponentManager, NotificationPoller};
use sortie::config::{Config, TokenStoreKind};
use sortie::session::{
    encode_test_token, Authorization, FileTokenStore, MemoryTokenStore, Session, SessionManager,
};
use std::sync::Arc;
use tokio::sync::RwLock;

fn offline_client() -> ApiClient {
    // Nothing listens on the discard port
    let transport = ReqwestTransport::new("http://127.0.0.1:9").expect("transport");
    let store = MemoryTokenStore::with_tokens("a-1", "r-1");
    ApiClient::new(Arc::new(transport), SessionManager::new(Arc::new(store)))
}

/// Smoke test to verify the default config
#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.token_store, TokenStoreKind::File);
    assert_eq!(config.tz(), chrono_tz::Tz::UTC);
    assert!(config.is_component_enabled("notification_poller"));
    assert!(!config.is_component_enabled("unknown"));
}

#[tokio::test]
async fn test_file_session_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("session.json");

    let first = SessionManager::new(Arc::new(FileTokenStore::new(&path)));
    let access = encode_test_token((Utc::now() + Duration::hours(1)).timestamp(), 42);
    first
        .start(&Session {
            access_token: access.clone(),
            refresh_token: "r-1".to_string(),
        })
        .await
        .expect("start");

    // A second process reading the same file
    let second = SessionManager::new(Arc::new(FileTokenStore::new(&path)));
    let session = second.current().await.expect("current").expect("session");
    assert_eq!(session.access_token, access);

    match second.authorization(Utc::now()).await.expect("authorization") {
        Authorization::Authorized(claims) => assert_eq!(claims.user_id, Some(42)),
        other => panic!("unexpected {:?}", other),
    }

    second.clear().await.expect("clear");
    assert_eq!(
        first.authorization(Utc::now()).await.expect("authorization"),
        Authorization::Unauthenticated
    );
}

#[tokio::test]
async fn test_expired_token_is_reported() {
    let expired = encode_test_token((Utc::now() - Duration::minutes(5)).timestamp(), 1);
    let sessions = SessionManager::new(Arc::new(MemoryTokenStore::with_tokens(&expired, "r-1")));
    assert_eq!(
        sessions.authorization(Utc::now()).await.expect("authorization"),
        Authorization::Expired
    );

    // Garbage counts as expired too, so it goes through a refresh
    let sessions = SessionManager::new(Arc::new(MemoryTokenStore::with_tokens("garbage", "r-1")));
    assert_eq!(
        sessions.authorization(Utc::now()).await.expect("authorization"),
        Authorization::Expired
    );
}

#[tokio::test]
async fn test_disabled_component_is_not_started() {
    let mut config = Config::default();
    config
        .components
        .insert("notification_poller".to_string(), false);

    let mut manager = ComponentManager::new(Arc::new(RwLock::new(config)));
    manager.register(NotificationPoller::new());
    manager.init_all(offline_client()).await.expect("init");

    let poller = manager
        .get_component_by_name("notification_poller")
        .and_then(|c| c.as_any().downcast_ref::<NotificationPoller>())
        .expect("registered");
    assert!(poller.get_handle().await.is_none());
}

#[tokio::test]
async fn test_poller_starts_and_shuts_down() {
    let mut manager = ComponentManager::new(Arc::new(RwLock::new(Config::default())));
    manager.register(NotificationPoller::new());
    assert_eq!(manager.len(), 1);

    // Polls fail against an offline server; the poller keeps running until shutdown
    manager.init_all(offline_client()).await.expect("init");
    let poller = manager
        .get_component_by_name("notification_poller")
        .and_then(|c| c.as_any().downcast_ref::<NotificationPoller>())
        .expect("registered");
    assert!(poller.get_handle().await.is_some());

    tokio::time::timeout(std::time::Duration::from_secs(5), manager.shutdown_all())
        .await
        .expect("shutdown in time")
        .expect("shutdown");
}

#[test]
fn test_cli_parses_subcommands() {
    let cli = Cli::try_parse_from(["sortie", "google", "sync"]).expect("parse");
    assert!(matches!(
        cli.command,
        Command::Google {
            action: GoogleAction::Sync
        }
    ));

    let cli = Cli::try_parse_from(["sortie", "parse-email", "--file", "mail.txt"]).expect("parse");
    assert!(matches!(cli.command, Command::ParseEmail { file: Some(_) }));

    assert!(Cli::try_parse_from(["sortie", "rsvp", "1", "maybe"]).is_err());
}
