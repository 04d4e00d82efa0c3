//! Pull-based change notification. Clients without a push channel re-fetch
//! on an interval measured from the completion of the previous fetch, so
//! slow responses never stack overlapping requests.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PollError {
    /// The polled entity no longer exists.
    #[error("entity not found")]
    NotFound,
    /// Network or decode failure; the next interval retries.
    #[error("poll fetch failed: {0}")]
    Transient(String),
}

/// Handle for an active polling loop. Dropping it does NOT stop the loop;
/// call [`Subscription::unsubscribe`].
pub struct Subscription {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stops re-arming the loop. A fetch already in flight completes and
    /// its result is still delivered once; no further fetch is scheduled.
    pub fn unsubscribe(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Waits for the polling task to finish. Mostly useful in tests.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

/// Repeatedly fetches and delivers fresh data until unsubscribed.
///
/// The first fetch runs immediately. Each subsequent fetch is scheduled
/// `interval` after the previous one completes. Fetch failures (including
/// not-found) are logged and the loop keeps going; the next interval is the
/// retry.
pub fn subscribe<F, Fut, T, C>(mut fetch: F, mut deliver: C, interval: Duration) -> Subscription
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, PollError>> + Send,
    T: Send + 'static,
    C: FnMut(T) + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();

    let task = tokio::spawn(async move {
        loop {
            match fetch().await {
                Ok(value) => deliver(value),
                Err(err) => warn!(error = %err, "poll fetch failed"),
            }
            if flag.load(Ordering::SeqCst) {
                break;
            }
            sleep(interval).await;
            if flag.load(Ordering::SeqCst) {
                break;
            }
        }
        debug!("poll loop stopped");
    });

    Subscription { stop, task }
}

/// Single-entity variant: polls one record and terminates permanently the
/// first time the fetch reports not-found, invoking `on_not_found` exactly
/// once. Transient failures are retried like [`subscribe`].
pub fn subscribe_one<F, Fut, T, C, N>(
    mut fetch: F,
    mut deliver: C,
    on_not_found: N,
    interval: Duration,
) -> Subscription
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, PollError>> + Send,
    T: Send + 'static,
    C: FnMut(T) + Send + 'static,
    N: FnOnce() + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();

    let task = tokio::spawn(async move {
        let mut on_not_found = Some(on_not_found);
        loop {
            match fetch().await {
                Ok(value) => deliver(value),
                Err(PollError::NotFound) => {
                    if let Some(callback) = on_not_found.take() {
                        callback();
                    }
                    debug!("polled entity is gone, stopping");
                    break;
                }
                Err(err) => warn!(error = %err, "poll fetch failed"),
            }
            if flag.load(Ordering::SeqCst) {
                break;
            }
            sleep(interval).await;
            if flag.load(Ordering::SeqCst) {
                break;
            }
        }
    });

    Subscription { stop, task }
}
