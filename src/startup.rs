use crate::shutdown;
use sortie::api::ApiClient;
use sortie::components::{ComponentManager, NotificationPoller};
use sortie::config::Config;
use sortie::error::Error;
use sortie::session::Authorization;
use sortie::utils::logging;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info, warn};

/// Filter for one-shot commands
pub const QUIET_FILTER: &str = logging::QUIET_FILTER;
/// Filter for `watch`, where the log is the output
pub const WATCH_FILTER: &str = logging::VERBOSE_FILTER;

/// Initialize logging with environment-based configuration
pub fn init_logging(default_filter: &str) -> miette::Result<()> {
    logging::init(default_filter)?;
    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// API client over the configured backend and token store
pub async fn build_client(config: &Arc<RwLock<Config>>) -> miette::Result<ApiClient> {
    let config = config.read().await;
    info!(
        "Using {} with {:?} token store",
        config.api_base_url, config.token_store
    );
    Ok(ApiClient::from_config(&config)?)
}

/// Run the background components until a termination signal arrives
pub async fn run_watch(config: Arc<RwLock<Config>>, client: ApiClient) -> miette::Result<()> {
    // Fail before starting anything if there is no usable session
    if !matches!(client.ensure_authorized().await?, Authorization::Authorized(_)) {
        return Err(Error::Unauthorized.into());
    }

    let poller = NotificationPoller::new();
    let session_ended = poller.session_ended();

    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(poller);
    let component_manager = Arc::new(component_manager);

    component_manager.init_all(client).await?;

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components).await;
    });

    info!("Watching notifications, press Ctrl+C to stop");
    tokio::select! {
        received = shutdown_recv => {
            if received.is_err() {
                error!("Signal handler exited without completing shutdown");
            }
            info!("Shutdown complete");
            Ok(())
        }
        _ = session_ended.cancelled() => {
            warn!("Session ended, stopping watch");
            component_manager.shutdown_all().await?;
            Err(Error::Unauthorized.into())
        }
    }
}
