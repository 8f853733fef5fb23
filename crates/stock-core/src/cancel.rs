//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is a shared flag that one thread raises and another
//! thread polls. Nothing is interrupted forcibly: the code doing the work checks
//! the token at convenient points and winds down on its own.
//!
//! # Example
//!
//! ```
//! use stock_core::CancellationToken;
//! use std::time::Duration;
//!
//! let token = CancellationToken::new();
//! let worker_token = token.clone();
//!
//! let worker = std::thread::spawn(move || {
//!     let mut chunks = 0;
//!     while !worker_token.is_cancelled() && chunks < 1_000 {
//!         // Transfer one chunk...
//!         chunks += 1;
//!         worker_token.wait_timeout(Duration::from_millis(1));
//!     }
//!     chunks
//! });
//!
//! token.cancel();
//! let chunks = worker.join().unwrap();
//! assert!(chunks <= 1_000);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A cancellation token for cooperative cancellation.
///
/// Clones share the same flag. Cancelling any clone is visible to all of them.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    cancelled: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                condvar: Condvar::new(),
                mutex: Mutex::new(()),
            }),
        }
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call raised the flag, `false` if the token was
    /// already cancelled.
    pub fn cancel(&self) -> bool {
        // Hold the lock while setting the flag to avoid a lost wakeup in `wait_timeout`
        let _guard = self.inner.mutex.lock();
        let first = !self.inner.cancelled.swap(true, Ordering::AcqRel);
        if first {
            self.inner.condvar.notify_all();
        }
        first
    }

    /// Block until the token is cancelled or `timeout` elapses.
    ///
    /// Returns `true` if the token is cancelled on return. Useful for code that
    /// sleeps between polls and should wake up early on cancellation.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.mutex.lock();
        while !self.is_cancelled() {
            if self
                .inner
                .condvar
                .wait_until(&mut guard, deadline)
                .timed_out()
            {
                break;
            }
        }
        self.is_cancelled()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
