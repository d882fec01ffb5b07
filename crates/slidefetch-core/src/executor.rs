//! Bounded worker pool that runs download tasks through a transport.
//!
//! `min(concurrency, tasks)` OS threads share one queue of pending tasks.
//! Each worker pops the next task, downloads it into the task's staging
//! directory and publishes the result without clobbering anything already in
//! the target directory. Finished tasks flow back over a channel; a failure
//! is recorded on its task and never stops the siblings.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};

use crate::cancel::CancelToken;
use crate::storage::{self, PublishError};
use crate::task::{DownloadTask, TaskState};
use crate::transport::{FetchContext, FetchError, Transport};

/// Worker count used when none (or zero) is configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Maps a requested concurrency to the one actually used (`0` means default).
pub fn effective_concurrency(requested: usize) -> usize {
    if requested == 0 {
        DEFAULT_CONCURRENCY
    } else {
        requested
    }
}

pub struct Executor {
    transport: Arc<dyn Transport>,
    target_dir: PathBuf,
    concurrency: usize,
    cancel: CancelToken,
}

impl Executor {
    pub fn new(
        transport: Arc<dyn Transport>,
        target_dir: impl Into<PathBuf>,
        concurrency: usize,
        cancel: CancelToken,
    ) -> Self {
        Self {
            transport,
            target_dir: target_dir.into(),
            concurrency: effective_concurrency(concurrency),
            cancel,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every task and returns them all, sorted by URL-list line.
    ///
    /// `on_finish(task, finished, total)` is called on the calling thread as
    /// each task reaches a terminal state. After cancellation, tasks no
    /// worker picked up come back still `Pending`.
    ///
    /// Tasks share a staging directory when they share a local name, so only
    /// the first task per name runs; later ones come back `Skipped`.
    pub fn run(
        &self,
        tasks: Vec<DownloadTask>,
        mut on_finish: impl FnMut(&DownloadTask, usize, usize),
    ) -> Vec<DownloadTask> {
        let total = tasks.len();
        if total == 0 {
            return tasks;
        }
        let mut claimed = HashSet::new();
        let (runnable, shadowed): (Vec<_>, Vec<_>) =
            tasks.into_iter().partition(|t| claimed.insert(t.name.clone()));

        let mut finished = Vec::with_capacity(total);
        for mut task in shadowed {
            tracing::warn!(url = %task.url, file = %task.name, "another URL in this run has the same file name, skipping");
            task.state = TaskState::Skipped;
            on_finish(&task, finished.len() + 1, total);
            finished.push(task);
        }

        let queue: Arc<Mutex<VecDeque<DownloadTask>>> = Arc::new(Mutex::new(runnable.into()));
        let (tx, rx) = mpsc::channel::<DownloadTask>();
        let workers = self.concurrency.min(total - finished.len());
        tracing::info!(tasks = total, workers, transport = self.transport.name(), "starting downloads");

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let transport = Arc::clone(&self.transport);
            let target_dir = self.target_dir.clone();
            let cancel = self.cancel.clone();
            handles.push(std::thread::spawn(move || loop {
                if cancel.is_cancelled() {
                    tracing::debug!(worker, "cancelled, not taking more tasks");
                    break;
                }
                let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                let Some(task) = next else {
                    break;
                };
                let fallback = task.clone();
                let done = panic::catch_unwind(AssertUnwindSafe(|| {
                    execute_one(transport.as_ref(), &target_dir, task, &cancel, worker)
                }))
                .unwrap_or_else(|_| {
                    tracing::error!(worker, url = %fallback.url, "download worker panicked");
                    let mut task = fallback;
                    task.fail("worker panicked");
                    task
                });
                if tx.send(done).is_err() {
                    break;
                }
            }));
        }
        drop(tx);

        for task in rx {
            on_finish(&task, finished.len() + 1, total);
            finished.push(task);
        }
        for handle in handles {
            if let Err(e) = handle.join() {
                tracing::error!("download worker panicked: {:?}", e);
            }
        }

        let leftover = std::mem::take(&mut *queue.lock().unwrap_or_else(PoisonError::into_inner));
        if !leftover.is_empty() {
            tracing::info!(count = leftover.len(), "tasks not started");
        }
        finished.extend(leftover);
        finished.sort_by_key(|t| t.line);
        finished
    }
}

/// Downloads and publishes one task, returning it in a terminal state.
fn execute_one(
    transport: &dyn Transport,
    target_dir: &Path,
    mut task: DownloadTask,
    cancel: &CancelToken,
    worker: usize,
) -> DownloadTask {
    if task.destination.exists() {
        tracing::info!(file = %task.destination.display(), "appeared since planning, skipping");
        task.state = TaskState::Skipped;
        return task;
    }
    task.state = TaskState::InProgress;
    tracing::info!(worker, url = %task.url, file = %task.name, "download started");

    let staging_dir = storage::staging_dir(target_dir, &task.name);
    let log_dir = target_dir.join(storage::LOG_DIR);
    if let Err(e) = fs::create_dir_all(&staging_dir) {
        task.fail(format!("cannot create {}: {}", staging_dir.display(), e));
        return task;
    }
    let ctx = FetchContext {
        staging_dir: &staging_dir,
        log_dir: &log_dir,
        cancel,
    };

    let staged = match transport.fetch(&task, &ctx) {
        Ok(staged) => staged,
        Err(FetchError::Cancelled) => {
            tracing::info!(worker, url = %task.url, "download interrupted, partial data kept");
            task.fail(FetchError::Cancelled.to_string());
            return task;
        }
        Err(e) => {
            tracing::warn!(worker, url = %task.url, kind = ?e.kind(), "download failed: {}", e);
            task.fail(e.to_string());
            return task;
        }
    };

    let dest = target_dir.join(&staged.file_name);
    match storage::publish_no_clobber(&staged.path, &dest) {
        Ok(()) => {
            tracing::info!(worker, url = %task.url, file = %dest.display(), "download complete");
            task.destination = dest;
            task.state = TaskState::Complete;
        }
        Err(PublishError::AlreadyExists(existing)) => {
            tracing::info!(file = %existing.display(), "destination already exists, keeping it");
            task.destination = existing;
            task.state = TaskState::Skipped;
        }
        Err(e) => {
            tracing::warn!(worker, url = %task.url, "publish failed: {}", e);
            task.fail(e.to_string());
            return task;
        }
    }
    storage::discard_staging(&staging_dir);
    task
}
