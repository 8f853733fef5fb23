//! Asynchronous URL request session.
//!
//! A [`Session`] accepts fetch requests from any thread, runs them on a fixed
//! pool of worker threads, and reports each outcome through a callback. Requests
//! can be canceled whether they are still queued or already in flight.
//!
//! # Lifecycle of a request
//!
//! 1. [`Session::submit`] queues the request and wakes one idle worker.
//! 2. A worker claims the oldest queued request, registers it as active and
//!    runs the transfer through the session's [`Transport`] without holding
//!    the session lock.
//! 3. The worker deregisters the request and invokes its callback.
//!
//! # Cancellation
//!
//! [`Session::cancel`] behaves differently depending on where the request is:
//!
//! - still queued: it is removed and its callback runs on the canceling thread
//!   before `cancel` returns;
//! - in flight: its abort flag is raised and `cancel` returns immediately. The
//!   owning worker notices the flag, stops the transfer and delivers the
//!   canceled response itself.
//!
//! Either way the callback runs exactly once.
//!
//! # Example
//!
//! ```no_run
//! use stock_net::{Session, SessionConfig};
//!
//! let session = Session::new(SessionConfig::default())?;
//!
//! let handle = session.submit("https://tile.example.com/3/2/1.png", |response| {
//!     if response.successful {
//!         println!("got {} bytes", response.data.len());
//!     } else if response.canceled {
//!         println!("canceled");
//!     }
//! });
//!
//! // Changed our mind.
//! session.cancel(handle);
//! # Ok::<(), stock_net::SessionError>(())
//! ```

mod queues;
mod worker;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use stock_core::PerfSpan;
use stock_core::logging::targets;

use self::queues::RequestQueues;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::request::{Request, RequestHandle};
use crate::response::Response;
use crate::transport::{HttpTransport, Transport};

/// State shared between the session handle and its workers.
pub(crate) struct Shared {
    queues: Mutex<RequestQueues>,
    /// Signaled once per submit, and for every worker on shutdown.
    request_available: Condvar,
    transport: Box<dyn Transport>,
}

/// An asynchronous URL request session.
///
/// `Session` is `Send + Sync`; share it between threads with an `Arc`.
/// Dropping it (or calling [`shutdown`](Self::shutdown)) cancels everything
/// outstanding and blocks until every callback has run and every worker has
/// exited.
pub struct Session {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    config: SessionConfig,
}

impl Session {
    /// Create a session that fetches over HTTP.
    ///
    /// The transport honors the connect and request timeouts of `config`.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let transport = HttpTransport::from_config(&config)?;
        Self::with_transport(config, transport)
    }

    /// Create a session that performs transfers through `transport`.
    pub fn with_transport<T: Transport>(
        config: SessionConfig,
        transport: T,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let session = Self {
            shared: Arc::new(Shared {
                queues: Mutex::new(RequestQueues::new()),
                request_available: Condvar::new(),
                transport: Box::new(transport),
            }),
            workers: Mutex::new(Vec::with_capacity(config.worker_count)),
            config,
        };

        for index in 0..session.config.worker_count {
            let shared = session.shared.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", session.config.thread_name, index))
                .spawn(move || worker::worker_loop(shared))
                // Dropping the session stops the workers already started
                .map_err(|e| SessionError::ThreadSpawn(e.to_string()))?;
            session.workers.lock().push(handle);
        }

        tracing::debug!(
            target: targets::SESSION,
            workers = session.config.worker_count,
            "session started"
        );
        Ok(session)
    }

    /// Get the session's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Queue a GET of `url` and return a handle for cancelling it.
    ///
    /// Never blocks on network I/O. `on_complete` is invoked exactly once,
    /// normally on a worker thread. If the session has already shut down,
    /// it is invoked immediately on this thread with a canceled response.
    pub fn submit<F>(&self, url: impl Into<String>, on_complete: F) -> RequestHandle
    where
        F: FnOnce(Response) + Send + 'static,
    {
        let mut queues = self.shared.queues.lock();
        let handle = queues.issue_handle();
        let request = Request {
            handle,
            url: url.into(),
            on_complete: Box::new(on_complete),
        };

        if !queues.is_running() {
            drop(queues);
            tracing::debug!(target: targets::SESSION, %handle, "session stopped, canceling request");
            worker::deliver(request, Response::canceled());
            return handle;
        }

        tracing::trace!(target: targets::SESSION, %handle, url = %request.url, "request queued");
        queues.push_pending(request);
        drop(queues);

        self.shared.request_available.notify_one();
        handle
    }

    /// Cancel a request.
    ///
    /// A queued request is removed and its callback runs with a canceled
    /// response before this returns. An in-flight request is flagged; its
    /// worker delivers the canceled response once it notices. Unknown or
    /// already completed handles are ignored.
    pub fn cancel(&self, handle: RequestHandle) {
        let mut queues = self.shared.queues.lock();

        if let Some(request) = queues.take_pending(handle) {
            drop(queues);
            tracing::debug!(target: targets::SESSION, %handle, "canceled pending request");
            worker::deliver(request, Response::canceled());
            return;
        }

        if queues.cancel_active(handle) {
            tracing::debug!(target: targets::SESSION, %handle, "flagged active request for cancellation");
        } else {
            tracing::trace!(target: targets::SESSION, %handle, "cancel ignored, request not outstanding");
        }
    }

    /// Number of requests waiting for a worker.
    pub fn pending_count(&self) -> usize {
        self.shared.queues.lock().pending_len()
    }

    /// Number of requests currently executing on a worker.
    pub fn active_count(&self) -> usize {
        self.shared.queues.lock().active_len()
    }

    /// Number of worker threads. Zero once the session has shut down.
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Whether the session still dispatches requests.
    pub fn is_running(&self) -> bool {
        self.shared.queues.lock().is_running()
    }

    /// Stop the session.
    ///
    /// Every queued request is canceled on this thread, every in-flight
    /// request is flagged, and the call blocks until all workers have
    /// delivered their last callback and exited. Later submits are canceled
    /// on the spot.
    ///
    /// Only the first call waits. Any other call, including one made
    /// concurrently from another thread while the first is still joining,
    /// returns immediately. Called from a completion callback, it does not
    /// join the worker running that callback; that worker exits on its own.
    pub fn shutdown(&self) {
        let drained = {
            let mut queues = self.shared.queues.lock();
            if !queues.is_running() {
                return;
            }
            queues.shutdown()
        };
        let _span = PerfSpan::new("session_shutdown");
        tracing::debug!(
            target: targets::SESSION,
            pending = drained.len(),
            "session shutting down"
        );

        self.shared.request_available.notify_all();
        for request in drained {
            worker::deliver(request, Response::canceled());
        }

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        let current = thread::current().id();
        for handle in workers {
            // A callback may shut the session down from its own worker
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::error!(target: targets::SESSION, "session worker panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("workers", &self.worker_count())
            .field("pending", &self.pending_count())
            .field("active", &self.active_count())
            .finish()
    }
}
