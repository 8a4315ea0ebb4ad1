use super::actor::{NotificationActor, NotificationActorHandle, PollReport};
use crate::error::ClientResult;
use crate::services::NotificationService;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the notification actor
#[derive(Clone)]
pub struct NotificationPollerHandle {
    actor_handle: NotificationActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl NotificationPollerHandle {
    /// Create a new handle and spawn the actor
    pub fn new(service: NotificationService, limit: u32) -> Self {
        let (mut actor, handle) = NotificationActor::new(service, limit);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Fetch the feed and report notifications not seen before
    pub async fn poll(&self) -> ClientResult<PollReport> {
        self.actor_handle.poll().await
    }

    pub async fn mark_all_read(&self) -> ClientResult<()> {
        self.actor_handle.mark_all_read().await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> ClientResult<()> {
        self.actor_handle.shutdown().await
    }
}
