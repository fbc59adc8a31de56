//! Bulkhead admission control
//!
//! Bounded concurrency plus a bounded wait queue: at most
//! `max_concurrent` submissions run at once, at most `max_queued` wait
//! for a slot, and anything beyond that is rejected immediately. Total
//! in-flight plus queued work is therefore capped at
//! `max_concurrent + max_queued`, which keeps one noisy tenant from
//! exhausting the process.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::warn;

use verdict_types::error::{Result, VerdictError};

/// Bounded-concurrency admission controller
pub struct Bulkhead {
    name: String,
    slots: Arc<Semaphore>,
    max_concurrent: usize,
    max_queued: usize,
    queued: AtomicUsize,
}

impl Bulkhead {
    /// Create a bulkhead with `max_concurrent` execution slots and a wait
    /// queue of capacity `max_queued`
    pub fn new(name: impl Into<String>, max_concurrent: usize, max_queued: usize) -> Self {
        Self {
            name: name.into(),
            slots: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            max_queued,
            queued: AtomicUsize::new(0),
        }
    }

    /// Submissions currently executing
    pub fn active(&self) -> usize {
        self.max_concurrent - self.slots.available_permits().min(self.max_concurrent)
    }

    /// Submissions currently waiting for a slot
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Run `task` inside the bulkhead.
    ///
    /// If a slot is free the task runs at once; otherwise the submission
    /// waits in FIFO order. A submission arriving when the queue is full
    /// fails immediately with [`VerdictError::BulkheadFull`].
    pub async fn submit<F, Fut, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let permit = match self.slots.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                // All slots busy: take a queue position if one is left
                if self.queued.fetch_add(1, Ordering::SeqCst) >= self.max_queued {
                    self.queued.fetch_sub(1, Ordering::SeqCst);
                    warn!(bulkhead = %self.name, "queue full, rejecting submission");
                    return Err(VerdictError::BulkheadFull(format!(
                        "{}: queue full",
                        self.name
                    )));
                }
                // Tokio semaphores are FIFO-fair, preserving arrival order
                let acquired = self.slots.clone().acquire_owned().await;
                self.queued.fetch_sub(1, Ordering::SeqCst);
                acquired.map_err(|_| {
                    VerdictError::BulkheadFull(format!("{}: semaphore closed", self.name))
                })?
            }
        };
        let outcome = task().await;
        drop(permit);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn runs_up_to_max_concurrent() {
        let bulkhead = Arc::new(Bulkhead::new("workflows", 2, 2));
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (release_tx2, release_rx2) = oneshot::channel::<()>();

        let b1 = bulkhead.clone();
        let first = tokio::spawn(async move {
            b1.submit(|| async {
                release_rx.await.ok();
                Ok::<_, verdict_types::VerdictError>(1)
            })
            .await
        });
        let b2 = bulkhead.clone();
        let second = tokio::spawn(async move {
            b2.submit(|| async {
                release_rx2.await.ok();
                Ok::<_, verdict_types::VerdictError>(2)
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(bulkhead.active(), 2);

        release_tx.send(()).unwrap();
        release_tx2.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), 1);
        assert_eq!(second.await.unwrap().unwrap(), 2);
        assert_eq!(bulkhead.active(), 0);
    }

    #[tokio::test]
    async fn rejects_when_queue_is_full() {
        let bulkhead = Arc::new(Bulkhead::new("workflows", 1, 1));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        // Occupy the single slot
        let b1 = bulkhead.clone();
        let running = tokio::spawn(async move {
            b1.submit(|| async {
                release_rx.await.ok();
                Ok::<_, verdict_types::VerdictError>(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Fill the single queue position
        let b2 = bulkhead.clone();
        let waiting = tokio::spawn(async move {
            b2.submit(|| async { Ok::<_, verdict_types::VerdictError>(()) }).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(bulkhead.queued(), 1);

        // Third submission overflows
        let err = bulkhead
            .submit(|| async { Ok::<_, verdict_types::VerdictError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, VerdictError::BulkheadFull(_)));

        release_tx.send(()).unwrap();
        running.await.unwrap().unwrap();
        waiting.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn slot_released_on_task_error() {
        let bulkhead = Bulkhead::new("workflows", 1, 0);
        let err = bulkhead
            .submit(|| async {
                Err::<(), _>(verdict_types::VerdictError::Messaging("boom".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VerdictError::Messaging(_)));
        // Slot is free again
        bulkhead
            .submit(|| async { Ok::<_, verdict_types::VerdictError>(()) })
            .await
            .unwrap();
    }
}
