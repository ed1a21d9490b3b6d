//! Dedicated single-threaded worker for clipboard and shell engine calls.
//!
//! # Design
//! - One OS thread owns every job so thread-affine backends see a single caller.
//! - Jobs are boxed closures on an unbounded queue; results come back over oneshot channels.
//! - A panicking job is caught and reported to its caller; the thread keeps serving.

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::error::{FsOpsError, FsOpsResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the apartment worker thread. Cloning shares the same thread.
#[derive(Clone, Debug)]
pub struct ApartmentWorker {
    sender: mpsc::UnboundedSender<Job>,
}

impl ApartmentWorker {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error when the OS refuses to spawn the thread.
    pub fn spawn(name: &str) -> FsOpsResult<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let thread_name = name.to_string();
        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!(thread = %thread_name, "apartment worker started");
                while let Some(job) = receiver.blocking_recv() {
                    job();
                }
                debug!(thread = %thread_name, "apartment worker stopped");
            })
            .map_err(|source| FsOpsError::io("apartment.spawn", name, source))?;
        Ok(Self { sender })
    }

    /// Run `job` on the worker thread and await its result.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::WorkerUnavailable`] when the thread has exited and
    /// [`FsOpsError::WorkerPanicked`] when the job panicked.
    pub async fn run<F, T>(&self, operation: &'static str, job: F) -> FsOpsResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, outcome) = oneshot::channel();
        let wrapped: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job));
            if result.is_err() {
                error!(operation, "apartment job panicked");
            }
            let _ = reply.send(result.ok());
        });
        self.sender
            .send(wrapped)
            .map_err(|_| FsOpsError::WorkerUnavailable { operation })?;

        match outcome.await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(FsOpsError::WorkerPanicked { operation }),
            Err(_) => Err(FsOpsError::WorkerUnavailable { operation }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn jobs_run_on_one_named_thread() -> anyhow::Result<()> {
        let worker = ApartmentWorker::spawn("apartment-test")?;
        let first = worker
            .run("test", || thread::current().name().map(str::to_string))
            .await?;
        let second = worker
            .run("test", || thread::current().name().map(str::to_string))
            .await?;
        assert_eq!(first.as_deref(), Some("apartment-test"));
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn panicking_job_is_reported_and_worker_survives() -> anyhow::Result<()> {
        let worker = ApartmentWorker::spawn("apartment-panic")?;
        let err = worker
            .run("explode", || -> u8 { panic!("boom") })
            .await
            .expect_err("panic surfaces as error");
        assert!(matches!(err, FsOpsError::WorkerPanicked { operation: "explode" }));

        let value = worker.run("after", || 7_u8).await?;
        assert_eq!(value, 7);
        Ok(())
    }

    #[tokio::test]
    async fn jobs_execute_in_submission_order() -> anyhow::Result<()> {
        let worker = ApartmentWorker::spawn("apartment-order")?;
        let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pending = Vec::new();
        for index in 0..5 {
            let log = std::sync::Arc::clone(&log);
            pending.push(worker.run("order", move || {
                if let Ok(mut entries) = log.lock() {
                    entries.push(index);
                }
            }));
        }
        for job in pending {
            job.await?;
        }
        let entries = log.lock().map(|entries| entries.clone()).unwrap_or_default();
        assert_eq!(entries, vec![0, 1, 2, 3, 4]);
        Ok(())
    }
}
