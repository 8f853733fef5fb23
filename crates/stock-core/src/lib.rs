//! Core threading primitives for Stock.
//!
//! This crate provides the building blocks shared by the networking layer:
//!
//! - **Cancellation**: [`CancellationToken`], a shared flag for cooperative
//!   cancellation of long-running work
//! - **Jobs**: [`JobQueue`] and [`WorkerPool`], a fixed pool of named threads
//!   executing queued closures in FIFO order
//! - **Logging**: tracing targets, span names and the `stock_*!` macros
//!
//! # Example
//!
//! ```
//! use stock_core::{CancellationToken, WorkerPool, WorkerPoolConfig};
//!
//! let pool = WorkerPool::new(WorkerPoolConfig::with_threads(2)).unwrap();
//! let token = CancellationToken::new();
//!
//! let job_token = token.clone();
//! pool.enqueue(move || {
//!     while !job_token.is_cancelled() {
//!         job_token.wait_timeout(std::time::Duration::from_millis(5));
//!     }
//! })
//! .unwrap();
//!
//! token.cancel();
//! pool.dispose();
//! ```

mod cancel;
mod error;
pub mod jobs;
pub mod logging;

pub use cancel::CancellationToken;
pub use error::{Result, ThreadPoolError};
pub use jobs::{Job, JobQueue, WorkerPool, WorkerPoolConfig};
pub use logging::PerfSpan;
