//! Fixed-size worker pool.

use std::any::Any;
use std::future::Future;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::matcher::Pattern;

use super::engine::{Match, SearchError};
use super::task::{CancelSignal, SearchTask};

type Outcome = Result<Match, SearchError>;
type Work = Box<dyn FnOnce(&SearchTask) -> Outcome + Send + 'static>;

struct Job {
    task: SearchTask,
    work: Work,
    reply: oneshot::Sender<Outcome>,
}

/// Counters shared between the pool handle and its workers.
#[derive(Debug, Default)]
struct PoolStats {
    active: AtomicUsize,
    peak_active: AtomicUsize,
    queued: AtomicUsize,
    completed: AtomicU64,
    attempts: AtomicU64,
}

/// Runs search tasks on a fixed set of OS threads.
///
/// Each task holds one worker for its whole lifetime. Tasks beyond the
/// worker count wait in a FIFO queue. Shutting the pool down (explicitly or
/// by dropping it) cancels running and queued tasks and joins every worker.
pub struct WorkerPool {
    num_workers: usize,
    /// Closed on shutdown so idle workers exit
    job_tx: Mutex<Option<Sender<Job>>>,
    /// Worker thread handles (Option to allow taking during join)
    handles: Mutex<Option<Vec<JoinHandle<()>>>>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<PoolStats>,
    next_id: AtomicU64,
    start_time: Instant,
}

impl WorkerPool {
    /// Creates a pool with `num_workers` threads (at least one).
    pub fn new(num_workers: usize) -> io::Result<Self> {
        let num_workers = num_workers.max(1);
        let (job_tx, job_rx) = unbounded();
        let stats = Arc::new(PoolStats::default());

        let handles = Self::spawn_workers(num_workers, job_rx, stats.clone())?;
        debug!(num_workers, "worker pool started");

        Ok(Self {
            num_workers,
            job_tx: Mutex::new(Some(job_tx)),
            handles: Mutex::new(Some(handles)),
            shutdown: Arc::new(AtomicBool::new(false)),
            stats,
            next_id: AtomicU64::new(1),
            start_time: Instant::now(),
        })
    }

    fn spawn_workers(
        num_workers: usize,
        job_rx: Receiver<Job>,
        stats: Arc<PoolStats>,
    ) -> io::Result<Vec<JoinHandle<()>>> {
        (0..num_workers)
            .map(|id| {
                let job_rx = job_rx.clone();
                let stats = stats.clone();

                thread::Builder::new()
                    .name(format!("vanity-worker-{}", id))
                    .spawn(move || worker_loop(id, job_rx, stats))
            })
            .collect()
    }

    /// Allocates a task whose cancel signal follows this pool's shutdown.
    pub fn new_task(&self, pattern: Pattern) -> SearchTask {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        SearchTask::with_signal(id, pattern, CancelSignal::linked(self.shutdown.clone()))
    }

    /// Queues `work` for execution and returns a handle resolving to its
    /// outcome. Never blocks.
    pub fn submit<F>(&self, task: SearchTask, work: F) -> Result<SearchHandle, SearchError>
    where
        F: FnOnce(&SearchTask) -> Outcome + Send + 'static,
    {
        if self.is_shut_down() {
            return Err(SearchError::PoolClosed);
        }
        let job_tx = lock(&self.job_tx);
        let job_tx = job_tx.as_ref().ok_or(SearchError::PoolClosed)?;

        let (reply, rx) = oneshot::channel();
        let handle = SearchHandle {
            task_id: task.id(),
            rx,
            cancel: task.cancel_signal().clone(),
            attempts: task.attempts_counter(),
            finished: false,
        };

        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        let job = Job {
            task,
            work: Box::new(work),
            reply,
        };
        if job_tx.send(job).is_err() {
            self.stats.queued.fetch_sub(1, Ordering::Relaxed);
            return Err(SearchError::PoolClosed);
        }

        Ok(handle)
    }

    /// Cancels all tasks and waits for the workers to exit. Later calls and
    /// later submissions are no-ops and `PoolClosed` respectively.
    ///
    /// Must not be called from inside a submitted task.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        lock(&self.job_tx).take();
        let handles = lock(&self.handles).take();
        if let Some(handles) = handles {
            for handle in handles {
                let _ = handle.join();
            }
            debug!("worker pool stopped");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Tasks currently running on a worker.
    pub fn active(&self) -> usize {
        self.stats.active.load(Ordering::Relaxed)
    }

    /// Highest number of simultaneously running tasks observed.
    pub fn peak_active(&self) -> usize {
        self.stats.peak_active.load(Ordering::Relaxed)
    }

    /// Tasks submitted but not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.stats.queued.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.stats.completed.load(Ordering::Relaxed)
    }

    /// Keypairs generated by finished tasks.
    pub fn total_attempts(&self) -> u64 {
        self.stats.attempts.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A worker panic is already captured per task, so a poisoned lock still
/// guards consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn worker_loop(id: usize, jobs: Receiver<Job>, stats: Arc<PoolStats>) {
    for Job { task, work, reply } in jobs.iter() {
        stats.queued.fetch_sub(1, Ordering::Relaxed);

        if task.cancel_signal().is_raised() || reply.is_closed() {
            debug!(worker_id = id, task_id = task.id(), "skipping cancelled task");
            stats.completed.fetch_add(1, Ordering::Relaxed);
            let _ = reply.send(Err(SearchError::Cancelled));
            continue;
        }

        let active = stats.active.fetch_add(1, Ordering::Relaxed) + 1;
        stats.peak_active.fetch_max(active, Ordering::Relaxed);
        debug!(worker_id = id, task_id = task.id(), "task started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&task)))
            .unwrap_or_else(|payload| Err(SearchError::Panicked(panic_message(payload.as_ref()))));

        stats.active.fetch_sub(1, Ordering::Relaxed);
        stats.completed.fetch_add(1, Ordering::Relaxed);
        stats.attempts.fetch_add(task.attempts(), Ordering::Relaxed);

        if let Err(SearchError::Panicked(message)) = &outcome {
            error!(worker_id = id, task_id = task.id(), %message, "search task panicked");
        }

        // The receiver may already be gone if the caller gave up
        let _ = reply.send(outcome);
    }

    debug!(worker_id = id, "worker exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

/// Resolves to the outcome of a submitted task.
///
/// Dropping an unfinished handle cancels the task.
pub struct SearchHandle {
    task_id: u64,
    rx: oneshot::Receiver<Outcome>,
    cancel: CancelSignal,
    attempts: Arc<AtomicU64>,
    finished: bool,
}

impl SearchHandle {
    pub fn task_id(&self) -> u64 {
        self.task_id
    }

    /// Raises the task's cancel signal. The handle still resolves, normally
    /// to [`SearchError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.raise();
    }

    /// Attempts published by the running search so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl Future for SearchHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(result) => {
                self.finished = true;
                Poll::Ready(result.unwrap_or(Err(SearchError::WorkerLost)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel.raise();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::SearchEngine;

    fn hard_pattern() -> Pattern {
        Pattern::parse("ffffff", "ffffff").unwrap()
    }

    fn submit_search(pool: &WorkerPool, pattern: Pattern) -> SearchHandle {
        let engine = SearchEngine::silent();
        let task = pool.new_task(pattern);
        pool.submit(task, move |task| engine.run(task)).unwrap()
    }

    #[tokio::test]
    async fn test_runs_search_to_completion() {
        let pool = WorkerPool::new(2).unwrap();
        let found = submit_search(&pool, Pattern::parse("b", "-").unwrap())
            .await
            .unwrap();

        assert!(found.keypair.address().to_hex().starts_with('b'));
        assert_eq!(pool.completed(), 1);
        assert_eq!(pool.total_attempts(), found.attempts);
    }

    #[tokio::test]
    async fn test_zero_workers_clamped_to_one() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.num_workers(), 1);
    }

    #[tokio::test]
    async fn test_task_ids_are_unique() {
        let pool = WorkerPool::new(1).unwrap();
        let a = pool.new_task(hard_pattern());
        let b = pool.new_task(hard_pattern());
        assert_ne!(a.id(), b.id());

        let first = submit_search(&pool, hard_pattern());
        let second = submit_search(&pool, hard_pattern());
        assert_ne!(first.task_id(), second.task_id());
        assert!(second.task_id() > b.id());
    }

    #[tokio::test]
    async fn test_cancel_running_task() {
        let pool = WorkerPool::new(1).unwrap();
        let handle = submit_search(&pool, hard_pattern());

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        assert!(matches!(handle.await, Err(SearchError::Cancelled)));
    }

    #[tokio::test]
    async fn test_queued_task_cancelled_without_running() {
        let pool = WorkerPool::new(1).unwrap();
        let running = submit_search(&pool, hard_pattern());
        let queued = submit_search(&pool, hard_pattern());

        queued.cancel();
        running.cancel();

        assert!(matches!(running.await, Err(SearchError::Cancelled)));
        assert!(matches!(queued.await, Err(SearchError::Cancelled)));
        assert_eq!(pool.queued(), 0);
    }

    #[tokio::test]
    async fn test_dropped_handle_frees_worker() {
        let pool = WorkerPool::new(1).unwrap();
        drop(submit_search(&pool, hard_pattern()));

        let found = submit_search(&pool, Pattern::parse("c", "-").unwrap())
            .await
            .unwrap();
        assert!(found.keypair.address().to_hex().starts_with('c'));
    }

    #[tokio::test]
    async fn test_panic_is_captured_and_worker_survives() {
        let pool = WorkerPool::new(1).unwrap();
        let task = pool.new_task(hard_pattern());
        let handle = pool
            .submit(task, |_| -> Outcome { panic!("boom") })
            .unwrap();

        match handle.await {
            Err(SearchError::Panicked(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let found = submit_search(&pool, Pattern::parse("-", "d").unwrap())
            .await
            .unwrap();
        assert!(found.keypair.address().to_hex().ends_with('d'));
    }

    #[tokio::test]
    async fn test_shared_pool_shutdown_rejects_new_work() {
        let pool = Arc::new(WorkerPool::new(1).unwrap());
        let handle = submit_search(&pool, hard_pattern());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let shared = pool.clone();
        shared.shutdown();
        shared.shutdown();

        assert!(matches!(handle.await, Err(SearchError::Cancelled)));
        let task = pool.new_task(hard_pattern());
        assert!(matches!(
            pool.submit(task, |_| Err(SearchError::WorkerLost)),
            Err(SearchError::PoolClosed)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_running_tasks() {
        let pool = WorkerPool::new(1).unwrap();
        let handle = submit_search(&pool, hard_pattern());

        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.shutdown();

        assert!(matches!(handle.await, Err(SearchError::Cancelled)));
    }
}
