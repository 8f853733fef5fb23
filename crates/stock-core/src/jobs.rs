//! Job queue and worker pool for background work.
//!
//! A [`WorkerPool`] owns a fixed number of named threads that pull jobs from a
//! shared FIFO [`JobQueue`]. Idle workers sleep on a condition variable and are
//! woken one at a time as jobs arrive.
//!
//! # Example
//!
//! ```
//! use stock_core::jobs::{WorkerPool, WorkerPoolConfig};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let pool = WorkerPool::new(WorkerPoolConfig::with_threads(2)).unwrap();
//! let counter = Arc::new(AtomicUsize::new(0));
//!
//! let (done_tx, done_rx) = std::sync::mpsc::channel();
//! for _ in 0..4 {
//!     let counter = counter.clone();
//!     let done_tx = done_tx.clone();
//!     pool.enqueue(move || {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         done_tx.send(()).unwrap();
//!     })
//!     .unwrap();
//! }
//! for _ in 0..4 {
//!     done_rx.recv().unwrap();
//! }
//!
//! pool.dispose();
//! assert_eq!(counter.load(Ordering::SeqCst), 4);
//! ```

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use crate::error::{Result, ThreadPoolError};
use crate::logging::{span_names, targets};

/// A unit of work executed by a [`WorkerPool`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A thread-safe FIFO queue of jobs.
#[derive(Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
}

impl JobQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a job onto the back of the queue.
    pub fn enqueue(&self, job: Job) {
        self.jobs.lock().push_back(job);
    }

    /// Pop the job at the front of the queue, if any.
    pub fn dequeue(&self) -> Option<Job> {
        self.jobs.lock().pop_front()
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Drop every queued job without running it. Returns how many were dropped.
    fn clear(&self) -> usize {
        let mut jobs = self.jobs.lock();
        let dropped = jobs.len();
        jobs.clear();
        dropped
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue").field("len", &self.len()).finish()
    }
}

/// Configuration for creating a [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub num_threads: usize,
    /// Name prefix for worker threads. Threads are named `{prefix}-{index}`.
    pub thread_name: String,
    /// Stack size for worker threads in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: 4,
            thread_name: "stock-worker".to_string(),
            stack_size: None,
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with a custom thread count.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    /// Set the thread name prefix.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the stack size for worker threads.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }
}

/// State shared between the pool handle and its threads.
struct PoolState {
    queue: JobQueue,
    /// Guards `disposed` and pairs with `job_available`.
    disposed: Mutex<bool>,
    job_available: Condvar,
}

/// A fixed-size pool of threads executing queued jobs in FIFO order.
pub struct WorkerPool {
    state: Arc<PoolState>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start a pool with the given configuration.
    ///
    /// Fails if `num_threads` is zero or a thread cannot be spawned. Threads
    /// started before a spawn failure are stopped and joined.
    pub fn new(config: WorkerPoolConfig) -> Result<Self> {
        if config.num_threads == 0 {
            return Err(ThreadPoolError::NoWorkers);
        }

        let pool = Self {
            state: Arc::new(PoolState {
                queue: JobQueue::new(),
                disposed: Mutex::new(false),
                job_available: Condvar::new(),
            }),
            handles: Mutex::new(Vec::with_capacity(config.num_threads)),
        };

        for index in 0..config.num_threads {
            let mut builder = thread::Builder::new().name(format!("{}-{}", config.thread_name, index));
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let state = pool.state.clone();
            match builder.spawn(move || worker_loop(state)) {
                Ok(handle) => pool.handles.lock().push(handle),
                Err(err) => {
                    pool.dispose();
                    return Err(ThreadPoolError::SpawnFailed(err.to_string()));
                }
            }
        }

        crate::stock_debug!(threads = config.num_threads, "worker pool started");
        Ok(pool)
    }

    /// Number of threads owned by the pool. Zero once disposed.
    pub fn num_threads(&self) -> usize {
        self.handles.lock().len()
    }

    /// Number of jobs waiting for a worker.
    pub fn queued_jobs(&self) -> usize {
        self.state.queue.len()
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        *self.state.disposed.lock()
    }

    /// Queue a job and wake one idle worker.
    pub fn enqueue<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let disposed = self.state.disposed.lock();
        if *disposed {
            return Err(ThreadPoolError::Disposed);
        }
        self.state.queue.enqueue(Box::new(job));
        drop(disposed);
        self.state.job_available.notify_one();
        Ok(())
    }

    /// Stop the pool and join every worker thread.
    ///
    /// Jobs still waiting in the queue are dropped without running. A job that
    /// is already executing finishes first. Calling `dispose` again is a no-op.
    ///
    /// May be called from one of the pool's own jobs; that worker is not
    /// joined and exits once the job returns.
    pub fn dispose(&self) {
        {
            let mut disposed = self.state.disposed.lock();
            if *disposed {
                return;
            }
            *disposed = true;
        }
        self.state.job_available.notify_all();

        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                crate::stock_error!("worker pool thread panicked");
            }
        }

        let dropped = self.state.queue.clear();
        if dropped > 0 {
            crate::stock_warn!(dropped, "worker pool disposed with jobs still queued");
        }
        tracing::debug!(target: targets::JOBS, dropped, "worker pool disposed");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads())
            .field("queued_jobs", &self.queued_jobs())
            .finish()
    }
}

/// The loop run by every pool thread.
fn worker_loop(state: Arc<PoolState>) {
    loop {
        let job = {
            let mut disposed = state.disposed.lock();
            loop {
                if *disposed {
                    return;
                }
                if let Some(job) = state.queue.dequeue() {
                    crate::stock_trace!(remaining = state.queue.len(), "job dequeued");
                    break job;
                }
                state.job_available.wait(&mut disposed);
            }
        };

        let _span = tracing::trace_span!(target: targets::JOBS, span_names::JOB).entered();
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!(target: targets::JOBS, "job panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_job_queue_fifo() {
        let queue = JobQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            queue.enqueue(Box::new(move || order.lock().push(i)));
        }
        assert_eq!(queue.len(), 3);

        while let Some(job) = queue.dequeue() {
            job();
        }

        assert!(queue.is_empty());
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_dispose_from_own_job() {
        let pool = Arc::new(Mutex::new(Some(
            WorkerPool::new(WorkerPoolConfig::with_threads(2)).unwrap(),
        )));
        let (tx, rx) = mpsc::channel();

        let owner = pool.clone();
        pool.lock()
            .as_ref()
            .unwrap()
            .enqueue(move || {
                let pool = owner.lock().take();
                drop(pool);
                tx.send(()).unwrap();
            })
            .unwrap();

        // The job ran to completion after dropping the pool it runs on
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(pool.lock().is_none());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = WorkerPool::new(WorkerPoolConfig::with_threads(0));
        assert_eq!(result.err(), Some(ThreadPoolError::NoWorkers));
    }

    #[test]
    fn test_pool_runs_jobs() {
        let pool = WorkerPool::new(WorkerPoolConfig::with_threads(3)).unwrap();
        assert_eq!(pool.num_threads(), 3);

        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        for _ in 0..10 {
            let counter = counter.clone();
            let tx = tx.clone();
            pool.enqueue(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                tx.send(()).unwrap();
            })
            .unwrap();
        }
        for _ in 0..10 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 10);
        pool.dispose();
        assert_eq!(pool.num_threads(), 0);
    }

    #[test]
    fn test_single_thread_preserves_order() {
        let pool = WorkerPool::new(WorkerPoolConfig::with_threads(1)).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();

        for i in 0..10 {
            let order = order.clone();
            let tx = tx.clone();
            pool.enqueue(move || {
                order.lock().push(i);
                tx.send(()).unwrap();
            })
            .unwrap();
        }
        for _ in 0..10 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }

        assert_eq!(*order.lock(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_enqueue_after_dispose() {
        let pool = WorkerPool::new(WorkerPoolConfig::with_threads(1)).unwrap();
        pool.dispose();
        assert!(pool.is_disposed());
        assert_eq!(pool.enqueue(|| {}), Err(ThreadPoolError::Disposed));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let pool = WorkerPool::new(WorkerPoolConfig::with_threads(2)).unwrap();
        pool.dispose();
        pool.dispose();
        assert!(pool.is_disposed());
    }

    #[test]
    fn test_panicking_job_keeps_worker_alive() {
        let pool = WorkerPool::new(WorkerPoolConfig::with_threads(1)).unwrap();
        let (tx, rx) = mpsc::channel();

        pool.enqueue(|| panic!("job failure")).unwrap();
        pool.enqueue(move || tx.send(42).unwrap()).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn test_thread_names() {
        let pool = WorkerPool::new(
            WorkerPoolConfig::with_threads(1).thread_name("named-pool"),
        )
        .unwrap();
        let (tx, rx) = mpsc::channel();

        pool.enqueue(move || {
            tx.send(thread::current().name().map(str::to_string)).unwrap();
        })
        .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("named-pool-0"));
    }
}
