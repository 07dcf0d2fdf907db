//! Debounced query dispatch
//!
//! Coalesces bursts of calls into one trailing execution: each call restarts
//! the quiescence window, and only the arguments of the last call before the
//! window elapses are ever executed.

use crate::geocoding::GeocodeError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A newer call (or cancellation) replaced this one before it ran
    #[error("Superseded by a newer query")]
    Superseded,
    #[error(transparent)]
    Search(#[from] GeocodeError),
}

type SearchFn<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, GeocodeError>> + Send + Sync>;

#[derive(Default)]
struct Pending {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Trailing debounce around an async search function.
///
/// At most one execution is scheduled at a time. Scheduling a new one aborts
/// the previous timer, which settles that caller with
/// [`DispatchError::Superseded`] rather than leaving it pending. An execution
/// that has already started is never interrupted.
pub struct Debouncer<A, T> {
    window: Duration,
    search: SearchFn<A, T>,
    pending: Arc<Mutex<Pending>>,
}

impl<A, T> Debouncer<A, T>
where
    A: Send + 'static,
    T: Send + 'static,
{
    pub fn new<F, Fut>(window: Duration, search: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, GeocodeError>> + Send + 'static,
    {
        let search: SearchFn<A, T> =
            Arc::new(move |args: A| -> BoxFuture<'static, Result<T, GeocodeError>> {
                search(args).boxed()
            });
        Self {
            window,
            search,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Schedule `args` to run once the window passes without another call.
    ///
    /// Must be called from within a tokio runtime. The returned future
    /// resolves with the search result, or with `Superseded` if a later call
    /// or [`cancel`](Self::cancel) got in first.
    pub fn call(&self, args: A) -> impl Future<Output = Result<T, DispatchError>> + Send + 'static {
        let (tx, rx) = oneshot::channel();

        let mut pending = lock(&self.pending);
        pending.generation += 1;
        let generation = pending.generation;
        if let Some(timer) = pending.timer.take() {
            debug!("Rescheduling debounced search");
            timer.abort();
        }

        let shared = Arc::clone(&self.pending);
        let search = Arc::clone(&self.search);
        let window = self.window;
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            {
                let mut pending = lock(&shared);
                if pending.generation != generation {
                    return;
                }
                // From here on the execution belongs to this caller.
                pending.timer = None;
            }
            let result = search(args).await.map_err(DispatchError::from);
            let _ = tx.send(result);
        }));
        drop(pending);

        async move { rx.await.unwrap_or(Err(DispatchError::Superseded)) }
    }

    /// Drop the scheduled execution, if any.
    pub fn cancel(&self) {
        let mut pending = lock(&self.pending);
        pending.generation += 1;
        if let Some(timer) = pending.timer.take() {
            debug!("Cancelled pending debounced search");
            timer.abort();
        }
    }

    /// Whether an execution is waiting for its window to elapse
    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        lock(&self.pending).timer.is_some()
    }
}

impl<A, T> Drop for Debouncer<A, T> {
    fn drop(&mut self) {
        let mut pending = lock(&self.pending);
        pending.generation += 1;
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
    }
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::ProviderKind;
    use tokio::time::Instant;

    type Log = Arc<Mutex<Vec<(String, Instant)>>>;

    fn recording(window_ms: u64, work_ms: u64) -> (Debouncer<String, String>, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let recorded = log.clone();
        let debouncer = Debouncer::new(Duration::from_millis(window_ms), move |query: String| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push((query.clone(), Instant::now()));
                tokio::time::sleep(Duration::from_millis(work_ms)).await;
                Ok(query.to_uppercase())
            }
        });
        (debouncer, log)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_only_last_call_after_window() {
        let start = Instant::now();
        let (debouncer, log) = recording(300, 0);

        let first = debouncer.call("wood".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = debouncer.call("woodward".to_string());

        let (first, second) = tokio::join!(first, second);
        assert!(matches!(first, Err(DispatchError::Superseded)));
        assert_eq!(second.unwrap(), "WOODWARD");

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, "woodward");
        let fired_at = log[0].1 - start;
        assert!(
            fired_at >= Duration::from_millis(400) && fired_at < Duration::from_millis(410),
            "fired at {:?}",
            fired_at
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_each_run() {
        let (debouncer, log) = recording(300, 0);

        assert_eq!(debouncer.call("a".to_string()).await.unwrap(), "A");
        assert_eq!(debouncer.call("b".to_string()).await.unwrap(), "B");

        let queries: Vec<String> = log.lock().unwrap().iter().map(|(q, _)| q.clone()).collect();
        assert_eq!(queries, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_execution_is_not_interrupted() {
        let (debouncer, log) = recording(300, 500);

        let first = debouncer.call("cass".to_string());
        // Window elapsed at 300ms; the first search is still running.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!debouncer.is_pending());
        let second = debouncer.call("cass ave".to_string());

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap(), "CASS");
        assert_eq!(second.unwrap(), "CASS AVE");
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_rejects_caller() {
        let debouncer: Debouncer<String, Vec<String>> =
            Debouncer::new(Duration::from_millis(300), |_query: String| async {
                Err(GeocodeError::Provider {
                    provider: ProviderKind::MapsCo,
                    status: 429,
                })
            });

        let err = debouncer.call("main".to_string()).await.unwrap_err();
        match err {
            DispatchError::Search(inner) => assert_eq!(inner.status(), Some(429)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_settles_pending_caller() {
        let (debouncer, log) = recording(300, 0);

        let pending = debouncer.call("jefferson".to_string());
        assert!(debouncer.is_pending());
        debouncer.cancel();

        assert!(matches!(pending.await, Err(DispatchError::Superseded)));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_settles_pending_caller() {
        let (debouncer, log) = recording(300, 0);

        let pending = debouncer.call("broadway".to_string());
        drop(debouncer);

        assert!(matches!(pending.await, Err(DispatchError::Superseded)));
        assert!(log.lock().unwrap().is_empty());
    }
}
