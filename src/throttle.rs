//! Fixed-window batching for rate-limited collaborators

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Runs tasks in batches of `batch_size`. Every task of a batch runs
/// concurrently on the calling task, the batch waits for all of them, and a
/// pause follows each batch except the last.
#[derive(Debug, Clone, Copy)]
pub struct BatchThrottle {
    batch_size: usize,
    pause: Duration,
}

impl BatchThrottle {
    /// A zero batch size is treated as one
    #[must_use]
    pub fn new(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause,
        }
    }

    /// Results come back in input order
    pub async fn run<I, F, Fut, T>(&self, items: Vec<I>, task: F) -> Vec<T>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = T>,
    {
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut remaining = items.into_iter().peekable();
        let mut batch_number = 0;

        while remaining.peek().is_some() {
            batch_number += 1;
            let batch: Vec<I> = remaining.by_ref().take(self.batch_size).collect();
            debug!(
                "Running batch {} ({} of {} items)",
                batch_number,
                batch.len(),
                total
            );
            results.extend(join_all(batch.into_iter().map(&task)).await);

            if remaining.peek().is_some() {
                tokio::time::sleep(self.pause).await;
            }
        }

        results
    }
}
