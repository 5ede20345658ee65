use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, Semaphore};

/// Admission-gated fan-out driver.
///
/// Every item is dispatched to its own task immediately; the semaphore only
/// bounds how many of those tasks *execute* at once. Scheduled-but-waiting
/// tasks cost memory proportional to the candidate count, while concurrent
/// network activity stays capped — this is deliberately not a fixed worker
/// pool.
pub struct Scheduler {
    gate: Arc<Semaphore>,
}

impl Scheduler {
    /// `concurrency` is validated at the config layer (1..=1000).
    pub fn new(concurrency: usize) -> Self {
        Self {
            gate: Arc::new(Semaphore::new(concurrency)),
        }
    }

    /// Fan `items` out across concurrent executions of `task`, collecting
    /// every `Some` output. Output order is completion order; callers must
    /// treat it as unordered.
    ///
    /// A panic inside one execution is absorbed at the join boundary: the
    /// item yields nothing and the rest of the run is unaffected.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Option<R>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut executions = FuturesUnordered::new();

        for item in items {
            let gate = self.gate.clone();
            let task = task.clone();
            let tx = tx.clone();
            executions.push(tokio::spawn(async move {
                let permit = gate.acquire_owned().await.expect("admission gate closed");
                let output = task(item).await;
                drop(permit);
                if let Some(output) = output {
                    let _ = tx.send(output);
                }
            }));
        }
        drop(tx);

        // Completion barrier: every execution is joined before the channel
        // drains, so consumers see each emitted result exactly once and the
        // stream ends deterministically.
        while let Some(joined) = executions.next().await {
            if let Err(err) = joined {
                tracing::warn!(%err, "probe execution aborted");
            }
        }

        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    }
}
