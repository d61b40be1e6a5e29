//! Wait-until-complete loop for long-running server jobs
//!
//! Memory imports, glossary imports and document translations are all
//! tracked the same way: sleep, fetch a fresh snapshot by id, repeat until
//! the snapshot reports completion or the caller's deadline passes.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::core::errors::{LaraError, Result};

/// A server-side job that can be polled by id
pub trait Operation {
    fn id(&self) -> &str;

    /// Whether the snapshot is in a terminal state
    fn is_complete(&self) -> bool;
}

/// Progress callback type
pub type ProgressCallback<'a, T> = Box<dyn FnMut(&T) + Send + 'a>;

/// Caller-side knobs for a wait
pub struct WaitOptions<'a, T> {
    max_wait: Option<Duration>,
    on_update: Option<ProgressCallback<'a, T>>,
}

impl<'a, T> WaitOptions<'a, T> {
    pub fn new() -> Self {
        Self {
            max_wait: None,
            on_update: None,
        }
    }

    /// Give up with a timeout once this much time has passed
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Called with every refreshed snapshot, never with the initial one
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&T) + Send + 'a,
    {
        self.on_update = Some(Box::new(callback));
        self
    }
}

impl<T> Default for WaitOptions<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WaitOptions<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitOptions")
            .field("max_wait", &self.max_wait)
            .field("on_update", &self.on_update.is_some())
            .finish()
    }
}

/// A failed wait, carrying the last snapshot known to be good
#[derive(Debug)]
pub struct WaitError<T> {
    pub snapshot: T,
    pub source: LaraError,
}

impl<T> WaitError<T> {
    pub fn into_parts(self) -> (T, LaraError) {
        (self.snapshot, self.source)
    }
}

impl<T> fmt::Display for WaitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

impl<T: fmt::Debug> std::error::Error for WaitError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl<T> From<WaitError<T>> for LaraError {
    fn from(err: WaitError<T>) -> Self {
        err.source
    }
}

/// Result of a wait
pub type WaitResult<T> = std::result::Result<T, WaitError<T>>;

/// Poll `fetch` every `interval` until the job completes.
///
/// The deadline is checked before each sleep. A failed fetch stops the wait
/// immediately; both failures return the last good snapshot.
pub async fn wait_until_complete<T, F, Fut>(
    initial: T,
    interval: Duration,
    options: WaitOptions<'_, T>,
    mut fetch: F,
) -> WaitResult<T>
where
    T: Operation,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let WaitOptions {
        max_wait,
        mut on_update,
    } = options;
    let start = Instant::now();
    let mut current = initial;

    while !current.is_complete() {
        if let Some(max_wait) = max_wait {
            let elapsed = start.elapsed();
            if elapsed > max_wait {
                warn!("Gave up waiting for {} after {:?}", current.id(), elapsed);
                let message = format!(
                    "operation {} did not complete within {:?}",
                    current.id(),
                    max_wait
                );
                return Err(WaitError {
                    snapshot: current,
                    source: LaraError::Timeout { message },
                });
            }
        }

        sleep(interval).await;

        let id = current.id().to_string();
        match fetch(id.clone()).await {
            Ok(updated) => {
                current = updated;
                debug!("Polled {} (complete: {})", id, current.is_complete());
                if let Some(callback) = on_update.as_mut() {
                    callback(&current);
                }
            }
            Err(e) => {
                warn!("Status fetch for {} failed: {}", id, e);
                return Err(WaitError {
                    snapshot: current,
                    source: e,
                });
            }
        }
    }

    info!("Operation {} completed", current.id());
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct Job {
        id: String,
        progress: f64,
    }

    impl Job {
        fn new(progress: f64) -> Self {
            Self {
                id: "job-1".to_string(),
                progress,
            }
        }
    }

    impl Operation for Job {
        fn id(&self) -> &str {
            &self.id
        }

        fn is_complete(&self) -> bool {
            self.progress >= 1.0
        }
    }

    const INTERVAL: Duration = Duration::from_secs(2);

    /// Fetch stub replaying a fixed sequence of progress values
    fn scripted(
        steps: Vec<Result<f64>>,
    ) -> (
        Arc<Mutex<usize>>,
        impl FnMut(String) -> std::future::Ready<Result<Job>>,
    ) {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let mut steps: VecDeque<Result<f64>> = steps.into();
        let fetch = move |id: String| {
            assert_eq!(id, "job-1");
            *counter.lock().unwrap() += 1;
            let next = steps.pop_front().unwrap_or(Ok(0.5)).map(Job::new);
            std::future::ready(next)
        };
        (calls, fetch)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_complete() {
        let (calls, fetch) = scripted(vec![Ok(0.3), Ok(0.7), Ok(1.0)]);
        let mut seen = Vec::new();

        let started = Instant::now();
        let result = wait_until_complete(
            Job::new(0.0),
            INTERVAL,
            WaitOptions::new().on_update(|job: &Job| seen.push(job.progress)),
            fetch,
        )
        .await
        .unwrap();

        assert_eq!(result, Job::new(1.0));
        assert_eq!(*calls.lock().unwrap(), 3);
        assert_eq!(seen, vec![0.3, 0.7, 1.0]);
        assert_eq!(started.elapsed(), INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_snapshot_returns_immediately() {
        let (calls, fetch) = scripted(vec![]);
        let mut callbacks = 0;

        let started = Instant::now();
        let result = wait_until_complete(
            Job::new(1.0),
            INTERVAL,
            WaitOptions::new().on_update(|_: &Job| callbacks += 1),
            fetch,
        )
        .await
        .unwrap();

        assert_eq!(result.progress, 1.0);
        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(callbacks, 0);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_last_fetched_snapshot() {
        let (calls, fetch) = scripted(vec![Ok(0.1), Ok(0.2), Ok(0.4), Ok(0.6)]);

        let err = wait_until_complete(
            Job::new(0.0),
            INTERVAL,
            WaitOptions::new().max_wait(Duration::from_secs(5)),
            fetch,
        )
        .await
        .unwrap_err();

        // deadline checked at 0s, 2s and 4s; passed at 6s after the third fetch
        assert!(err.source.is_timeout());
        assert_eq!(*calls.lock().unwrap(), 3);
        assert_eq!(err.snapshot, Job::new(0.4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_keeps_last_good_snapshot() {
        let (calls, fetch) = scripted(vec![
            Ok(0.5),
            Err(LaraError::Connection {
                message: "connection reset".to_string(),
            }),
            Ok(1.0),
        ]);

        let err = wait_until_complete(Job::new(0.0), INTERVAL, WaitOptions::new(), fetch)
            .await
            .unwrap_err();

        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(err.snapshot, Job::new(0.5));
        assert!(matches!(err.source, LaraError::Connection { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_error_converts_into_lara_error() {
        let (_, fetch) = scripted(vec![Err(LaraError::Decode {
            message: "bad".to_string(),
        })]);

        let result: Result<Job> = async {
            let job =
                wait_until_complete(Job::new(0.0), INTERVAL, WaitOptions::new(), fetch).await?;
            Ok::<Job, LaraError>(job)
        }
        .await;

        assert!(matches!(result, Err(LaraError::Decode { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_waits_do_not_interfere() {
        let (_, first) = scripted(vec![Ok(1.0)]);
        let (_, second) = scripted(vec![Ok(0.5), Ok(1.0)]);

        let (a, b) = tokio::join!(
            wait_until_complete(Job::new(0.0), INTERVAL, WaitOptions::new(), first),
            wait_until_complete(Job::new(0.0), INTERVAL, WaitOptions::new(), second),
        );

        assert!(a.unwrap().is_complete());
        assert!(b.unwrap().is_complete());
    }
}
