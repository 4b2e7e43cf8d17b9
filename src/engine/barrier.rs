//! Completion barrier and worker pool.
//!
//! [`TaskGroup`] counts outstanding work with a `tokio_util` task tracker and
//! caps concurrent work with a semaphore. Work is counted from the moment it
//! is registered, not from when it starts running, so a job waiting for a
//! pool slot still holds the run open.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;

/// One unit of outstanding work. The barrier cannot drain while it is alive.
#[derive(Debug)]
pub struct WorkToken {
    _token: TaskTrackerToken,
}

/// Structured-concurrency group implementing the completion barrier.
///
/// Cloning yields a handle to the same group.
#[derive(Clone, Debug)]
pub struct TaskGroup {
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
}

impl TaskGroup {
    /// Creates a group allowing `concurrency` spawned jobs to run at once.
    pub fn new(concurrency: usize) -> Self {
        Self {
            tracker: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Registers pending work. Drop the token when the work is finished.
    pub fn token(&self) -> WorkToken {
        WorkToken {
            _token: self.tracker.token(),
        }
    }

    /// Runs `job` on the pool once a slot is free.
    ///
    /// The job is counted before this waits for a slot, so the caller (never
    /// the bus) is what blocks when the pool is saturated. A panicking job is
    /// logged and counted as finished.
    pub async fn spawn<F>(&self, label: &str, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token();
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                log::error!("Worker pool closed, dropping job {label}");
                return;
            }
        };
        let label = label.to_string();
        self.tracker.spawn(async move {
            let _token = token;
            let _permit = permit;
            if let Err(panic) = AssertUnwindSafe(job).catch_unwind().await {
                log::error!("Job {label} panicked: {}", panic_message(panic.as_ref()));
            }
        });
    }

    /// Number of jobs and tokens still outstanding.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until no work is outstanding.
    ///
    /// Work registered while waiting extends the wait. The group can be
    /// reused afterwards.
    pub async fn join_all(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_join_all_on_empty_group_returns() {
        let group = TaskGroup::new(2);
        tokio::time::timeout(Duration::from_secs(1), group.join_all())
            .await
            .expect("empty group should drain immediately");
    }

    #[tokio::test]
    async fn test_join_all_waits_for_nested_work() {
        let group = TaskGroup::new(4);
        let done = Arc::new(AtomicUsize::new(0));

        let inner_group = group.clone();
        let inner_done = Arc::clone(&done);
        group
            .spawn("outer", async move {
                // Registered before the outer job finishes, so the barrier stays up
                let token = inner_group.token();
                let done = Arc::clone(&inner_done);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                    drop(token);
                });
                inner_done.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        group.join_all().await;
        assert_eq!(done.load(Ordering::SeqCst), 2);
        assert_eq!(group.pending(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let group = TaskGroup::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            group
                .spawn("capped", async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .await;
        }

        group.join_all().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_job_still_releases_barrier() {
        let group = TaskGroup::new(1);
        group
            .spawn("boom", async {
                panic!("job failure");
            })
            .await;
        tokio::time::timeout(Duration::from_secs(1), group.join_all())
            .await
            .expect("panicked job must not hold the barrier");

        // The slot was returned as well
        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);
        group
            .spawn("after", async move {
                flag.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        group.join_all().await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
