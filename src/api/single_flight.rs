use crate::error::{ClientResult, Error};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T, Arc<Error>>>>;

/// Runs at most one instance of an operation at a time; callers that arrive while it is
/// running await the same outcome.
///
/// The slot is emptied by the first caller to observe the settled outcome. A settled
/// outcome left behind by cancelled callers is never handed out again.
pub struct SingleFlight<T> {
    slot: Mutex<Option<SharedOutcome<T>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the operation in flight, or start one with `start`
    pub async fn run<F, Fut>(&self, start: F) -> Result<T, Arc<Error>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        let shared = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(current) if current.peek().is_none() => {
                    debug!("Joining operation already in flight");
                    current.clone()
                }
                _ => {
                    let outcome = start().map(|result| result.map_err(Arc::new)).boxed().shared();
                    *slot = Some(outcome.clone());
                    outcome
                }
            }
        };

        let result = shared.clone().await;

        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&shared)) {
            *slot = None;
        }

        result
    }

    /// Whether an operation is currently running
    pub fn in_flight(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|current| current.peek().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let flight = Arc::new(SingleFlight::<String>::new());
        let starts = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let mut tasks = Vec::new();
        for _ in 0..5 {
            let flight = Arc::clone(&flight);
            let starts = Arc::clone(&starts);
            let gate = Arc::clone(&gate);
            tasks.push(tokio::spawn(async move {
                flight
                    .run(|| async move {
                        starts.fetch_add(1, Ordering::SeqCst);
                        gate.notified().await;
                        Ok("token-2".to_string())
                    })
                    .await
            }));
        }

        // Let every task reach the shared future before releasing it
        while !flight.in_flight() || tasks.iter().any(|t| t.is_finished()) {
            tokio::task::yield_now().await;
        }
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "token-2");
        }
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(!flight.in_flight());
    }

    #[tokio::test]
    async fn test_slot_cleared_after_failure() {
        let flight = SingleFlight::<String>::new();

        let first = flight
            .run(|| async { Err(Error::Unauthorized) })
            .await;
        assert!(matches!(first.unwrap_err().as_ref(), Error::Unauthorized));
        assert!(!flight.in_flight());

        let second = flight.run(|| async { Ok("fresh".to_string()) }).await;
        assert_eq!(second.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_settled_outcome_is_not_reused() {
        let flight = SingleFlight::<u32>::new();
        assert_eq!(flight.run(|| async { Ok(1) }).await.unwrap(), 1);
        assert_eq!(flight.run(|| async { Ok(2) }).await.unwrap(), 2);
    }
}
