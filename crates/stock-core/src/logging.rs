//! Logging facilities for Stock.
//!
//! Stock uses the `tracing` crate for instrumentation. The libraries never
//! install a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_max_level(tracing::Level::DEBUG)
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Use the constants in [`targets`] to filter by subsystem, e.g.
//! `RUST_LOG=stock_net::session=trace`.

/// Span names used throughout Stock for tracing.
pub mod span_names {
    /// A single transfer executed by a session worker.
    pub const TRANSFER: &str = "stock::transfer";
    /// A job executed by a worker pool thread.
    pub const JOB: &str = "stock::job";
}

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "stock_core";
    /// Worker pool target.
    pub const JOBS: &str = "stock_core::jobs";
    /// Request session target.
    pub const SESSION: &str = "stock_net::session";
    /// HTTP transport target.
    pub const TRANSPORT: &str = "stock_net::transport";
    /// Performance spans.
    pub const PERF: &str = "stock::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for tracking the duration of an operation.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "stock::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Thin wrappers around the `tracing` macros with the core target.
#[macro_export]
macro_rules! stock_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "stock_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! stock_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "stock_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! stock_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "stock_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! stock_error {
    ($($arg:tt)*) => {
        tracing::error!(target: "stock_core", $($arg)*)
    };
}
