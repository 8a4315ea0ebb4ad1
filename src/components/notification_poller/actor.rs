use crate::api::models::{Notification, NotificationFeed};
use crate::error::{other_error, ClientResult, Error};
use crate::services::NotificationService;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What one poll found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    pub unread_count: u32,
    /// Unread notifications not reported by an earlier poll
    pub fresh: Vec<Notification>,
}

/// Commands that can be sent to the notification actor
pub enum NotificationCommand {
    Poll(mpsc::Sender<ClientResult<PollReport>>),
    MarkAllRead(mpsc::Sender<ClientResult<()>>),
    Shutdown,
}

/// Handle for communicating with the notification actor
#[derive(Clone)]
pub struct NotificationActorHandle {
    command_tx: mpsc::Sender<NotificationCommand>,
}

impl NotificationActorHandle {
    pub async fn poll(&self) -> ClientResult<PollReport> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(NotificationCommand::Poll(response_tx))
            .await
            .map_err(|e| other_error(&format!("Notification actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or(Error::Cancelled)?
    }

    pub async fn mark_all_read(&self) -> ClientResult<()> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(NotificationCommand::MarkAllRead(response_tx))
            .await
            .map_err(|e| other_error(&format!("Notification actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or(Error::Cancelled)?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> ClientResult<()> {
        let _ = self.command_tx.send(NotificationCommand::Shutdown).await;
        Ok(())
    }
}

/// Owns the notification feed state between polls
pub struct NotificationActor {
    service: NotificationService,
    limit: u32,
    seen: HashSet<i64>,
    command_rx: mpsc::Receiver<NotificationCommand>,
}

impl NotificationActor {
    /// Create a new actor and return its handle
    pub fn new(service: NotificationService, limit: u32) -> (Self, NotificationActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            service,
            limit,
            seen: HashSet::new(),
            command_rx,
        };

        (actor, NotificationActorHandle { command_tx })
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Notification actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                NotificationCommand::Poll(response_tx) => {
                    let result = self.poll().await;
                    let _ = response_tx.send(result).await;
                }
                NotificationCommand::MarkAllRead(response_tx) => {
                    let result = self.service.mark_all_read().await;
                    let _ = response_tx.send(result).await;
                }
                NotificationCommand::Shutdown => {
                    info!("Notification actor shutting down");
                    break;
                }
            }
        }

        info!("Notification actor shut down");
    }

    async fn poll(&mut self) -> ClientResult<PollReport> {
        let feed = self.service.list(self.limit).await?;
        let report = take_fresh(&mut self.seen, feed);
        debug!(
            "Polled notifications: {} unread, {} new",
            report.unread_count,
            report.fresh.len()
        );
        Ok(report)
    }
}

/// Unread notifications whose ids are not in `seen`; records them as seen
pub fn take_fresh(seen: &mut HashSet<i64>, feed: NotificationFeed) -> PollReport {
    let fresh = feed
        .results
        .into_iter()
        .filter(|n| n.is_unread() && seen.insert(n.id))
        .collect();

    PollReport {
        unread_count: feed.unread_count,
        fresh,
    }
}
