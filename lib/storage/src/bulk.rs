//! Bounded-concurrency bulk execution with periodic progress reporting.

use crate::response::{CosmosResponse, ErrorInfo};
use cosmap_core::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Called with every response collected so far.
pub type ProgressCallback<R> = Box<dyn FnMut(&[CosmosResponse<R>]) + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOptions {
    /// Number of worker tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval between progress callbacks.
    #[serde(default = "default_report_every")]
    pub report_every: Duration,
}

fn default_concurrency() -> usize {
    4
}

fn default_report_every() -> Duration {
    Duration::from_secs(10)
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            report_every: default_report_every(),
        }
    }
}

impl BulkOptions {
    pub fn new(concurrency: usize, report_every: Duration) -> Self {
        Self {
            concurrency,
            report_every,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.report_every.is_zero() {
            return Err(Error::InvalidConfig("report_every must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Apply `operation` to every item using `options.concurrency` workers.
///
/// Returns exactly one response per item, in completion order. A failing or
/// panicking operation yields a failed response and does not stop the batch.
/// `on_progress` runs every `options.report_every` from a single task, and
/// once more with the complete set when the batch finishes.
pub async fn bulk_apply<T, R, F, Fut>(
    items: Vec<T>,
    operation: F,
    options: &BulkOptions,
    on_progress: Option<ProgressCallback<R>>,
) -> Result<Vec<CosmosResponse<R>>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CosmosResponse<R>> + Send + 'static,
{
    options.validate()?;

    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let workers = options.concurrency.min(total);
    debug!("bulk: {} items across {} workers", total, workers);

    let queue = Arc::new(Mutex::new(items.into_iter()));
    let operation = Arc::new(operation);
    let (tx, rx) = mpsc::unbounded_channel();

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let queue = queue.clone();
        let operation = operation.clone();
        let tx = tx.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let next = queue.lock().next();
                let Some(item) = next else { break };

                let operation = operation.clone();
                let response = match tokio::spawn(async move { operation(item).await }).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("bulk worker {}: operation did not complete: {}", worker_id, e);
                        CosmosResponse::failure(ErrorInfo::new(
                            ErrorInfo::INTERNAL,
                            format!("operation did not complete: {e}"),
                        ))
                    }
                };

                if tx.send(response).is_err() {
                    break;
                }
            }
        }));
    }
    drop(tx);

    let results = collect(rx, total, options.report_every, on_progress).await;

    for handle in handles {
        if let Err(e) = handle.await {
            warn!("bulk worker task failed: {}", e);
        }
    }

    let failed = results.iter().filter(|r| !r.is_successful).count();
    info!("bulk finished: {} items, {} failed", results.len(), failed);

    Ok(results)
}

/// Owns the result set and drives the progress timer until every worker has
/// hung up.
async fn collect<R>(
    mut rx: mpsc::UnboundedReceiver<CosmosResponse<R>>,
    total: usize,
    every: Duration,
    mut on_progress: Option<ProgressCallback<R>>,
) -> Vec<CosmosResponse<R>> {
    let mut results = Vec::with_capacity(total);
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(response) => results.push(response),
                None => break,
            },
            _ = ticker.tick() => {
                info!("bulk progress: {}/{}", results.len(), total);
                if let Some(callback) = on_progress.as_mut() {
                    callback(&results);
                }
            }
        }
    }

    if let Some(callback) = on_progress.as_mut() {
        callback(&results);
    }
    results
}
