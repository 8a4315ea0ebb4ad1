mod actor;
mod handle;
mod scheduler;

pub use actor::{take_fresh, PollReport};
pub use handle::NotificationPollerHandle;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::ClientResult;
use crate::services::NotificationService;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use scheduler::start_scheduler;

/// Polls the notification feed in the background and logs new items
#[derive(Default)]
pub struct NotificationPoller {
    handle: RwLock<Option<NotificationPollerHandle>>,
    cancel: CancellationToken,
    session_ended: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handle if it exists
    pub async fn get_handle(&self) -> Option<NotificationPollerHandle> {
        self.handle.read().await.clone()
    }

    /// Cancelled when a poll finds the session gone for good
    pub fn session_ended(&self) -> CancellationToken {
        self.session_ended.clone()
    }
}

#[async_trait]
impl super::Component for NotificationPoller {
    fn name(&self) -> &'static str {
        "notification_poller"
    }

    async fn init(&self, config: Arc<RwLock<Config>>, client: ApiClient) -> ClientResult<()> {
        let (interval, limit, tz) = {
            let config = config.read().await;
            (
                Duration::from_secs(config.notification_poll_interval),
                config.notification_limit,
                config.tz(),
            )
        };

        let handle = {
            let mut handle_lock = self.handle.write().await;
            match handle_lock.as_ref() {
                Some(handle) => handle.clone(),
                None => {
                    let handle =
                        NotificationPollerHandle::new(NotificationService::new(client), limit);
                    *handle_lock = Some(handle.clone());
                    handle
                }
            }
        };

        let task = start_scheduler(
            handle,
            interval,
            tz,
            self.cancel.child_token(),
            self.session_ended.clone(),
        );
        *self.task.lock().await = Some(task);
        info!("Notification poller started");
        Ok(())
    }

    async fn shutdown(&self) -> ClientResult<()> {
        self.cancel.cancel();

        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                error!("Notification poller task failed: {}", e);
            }
        }

        if let Some(handle) = self.handle.read().await.as_ref() {
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
